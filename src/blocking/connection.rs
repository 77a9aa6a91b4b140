use crate::config::ConnConf;
use crate::error::{FixtureError, Result};
use crate::ADMIN_DB_NAME;
use bson::{doc, Document};
use mongodb::sync::{Client, Collection, Database};
use tracing::info;

/// A simple abstraction for one fixture tool's database connection.
///
/// The connection is opened once per invocation and released when dropped, so every
/// exit path (success, handled error or interrupt) closes it.
pub struct Connection {
    client: Client,
    db_name: String,
    redacted_uri: String,
}

impl Connection {
    /// Connect to the database described by `conf` and check it's reachable.
    pub fn open(conf: &ConnConf) -> Result<Connection> {
        let redacted_uri = conf.redacted_uri();
        info!(uri = %redacted_uri, db = conf.get_db(), "Connecting to database.");
        let client = Client::with_uri_str(conf.get_uri())?;
        if let Err(e) = client
            .database(ADMIN_DB_NAME)
            .run_command(doc! {"ping": 1}, None)
        {
            return Err(FixtureError::ConnectError {
                uri: redacted_uri,
                detail: e,
            });
        }
        info!(db = conf.get_db(), "Database connected.");
        Ok(Connection {
            client,
            db_name: conf.get_db().to_string(),
            redacted_uri,
        })
    }

    /// get the fixture database.
    pub fn get_db(&self) -> Database {
        self.client.database(&self.db_name)
    }

    /// get collection `name` in the fixture database.
    pub fn coll(&self, name: &str) -> Collection<Document> {
        self.get_db().collection(name)
    }

    /// get database name.
    pub fn get_db_name(&self) -> &str {
        &self.db_name
    }

    /// get connection string, with the password masked.
    pub fn get_redacted_uri(&self) -> &str {
        &self.redacted_uri
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        info!(db = %self.db_name, "Database connection released.");
    }
}
