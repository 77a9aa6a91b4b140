//! Connection configuration shared by all fixture tools.
//!
//! Every value is resolved with the following precedence:
//! command line flag > environment variable > configuration file > compiled-in default.
//!
//! Configuration file example:
//! ```toml
//! [database]
//! # mongodb connection string.
//! uri = "mongodb://localhost:27017"
//! # database which holds the quiz platform collections.
//! name = "sports_knowledge_platform"
//! ```
use crate::error::{FixtureError, Result};
use crate::{DATABASE_NAME_ENV, DEFAULT_DATABASE, DEFAULT_URI, MONGODB_URI_ENV};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Connection flags, flattened into every binary's options.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ConnArgs {
    /// mongodb connection string, overrides `MONGODB_URI`.
    #[clap(long, alias = "connection")]
    pub mongo_uri: Option<String>,
    /// database name, overrides `DATABASE_NAME`.
    #[clap(long)]
    pub database: Option<String>,
    /// optional toml configuration file.
    #[clap(long)]
    pub conf: Option<PathBuf>,
}

/// Resolved connection configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnConf {
    uri: String,
    db: String,
}

impl ConnConf {
    /// create a configuration from explicit values.
    pub fn new(uri: impl Into<String>, db: impl Into<String>) -> Self {
        ConnConf {
            uri: uri.into(),
            db: db.into(),
        }
    }

    /// Resolve configuration from `args`, process environment and the optional config file.
    pub fn resolve(args: &ConnArgs) -> Result<ConnConf> {
        Self::resolve_with(args, |key| std::env::var(key).ok())
    }

    /// Same as [resolve](ConnConf::resolve), but reads environment variables through `env`.
    pub fn resolve_with<F>(args: &ConnArgs, env: F) -> Result<ConnConf>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = match &args.conf {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        let uri = args
            .mongo_uri
            .clone()
            .or_else(|| env(MONGODB_URI_ENV))
            .or(file.database.uri)
            .unwrap_or_else(|| DEFAULT_URI.to_string());
        let db = args
            .database
            .clone()
            .or_else(|| env(DATABASE_NAME_ENV))
            .or(file.database.name)
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string());
        Ok(ConnConf { uri, db })
    }

    /// get mongodb connection string.
    pub fn get_uri(&self) -> &str {
        &self.uri
    }

    /// get database name.
    pub fn get_db(&self) -> &str {
        &self.db
    }

    /// connection string with the password part masked, safe for logs and reports.
    pub fn redacted_uri(&self) -> String {
        redact_uri(&self.uri)
    }
}

/// Mask the password of `uri`'s user info, if any.
pub fn redact_uri(uri: &str) -> String {
    let (scheme, rest) = match uri.split_once("://") {
        Some(x) => x,
        None => return uri.to_string(),
    };
    let host_start = rest.find('/').unwrap_or(rest.len());
    let authority = &rest[..host_start];
    match authority.rsplit_once('@') {
        Some((user_info, host)) => {
            let user = user_info.split_once(':').map_or(user_info, |(u, _)| u);
            format!("{}://{}:****@{}{}", scheme, user, host, &rest[host_start..])
        }
        None => uri.to_string(),
    }
}

/// On-disk configuration file.
#[derive(Deserialize, Debug, Default)]
struct FileConfig {
    #[serde(default)]
    database: DatabaseSection,
}

/// `[database]` section, every key is optional.
#[derive(Deserialize, Debug, Default)]
struct DatabaseSection {
    uri: Option<String>,
    name: Option<String>,
}

impl FileConfig {
    fn load(path: &Path) -> Result<FileConfig> {
        let data = std::fs::read_to_string(path).map_err(|source| FixtureError::IoError {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&data).map_err(|source| FixtureError::ConfigError {
            path: path.to_path_buf(),
            source,
        })
    }
}
