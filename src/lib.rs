//! Mongo fixture lib, which moves json fixtures into and out of the quiz platform mongodb.
//!
//! Provides three database tools: [Exporter], [Seeder] and [SupplementImporter], and
//! file-only credential helpers in [credential].
//!
//! [Exporter] dumps collections to pretty-printed json files, [Seeder] imports the fixture
//! set in dependency order, [SupplementImporter] imports ad-hoc fixture pairs and checks
//! class membership references.
//!
//! # Seeder example:
//! ```no_run
//! use mongo_fixture::{ConnConf, Connection, Interrupt, SeedOptions, Seeder};
//!
//! let conf = ConnConf::new("mongodb://localhost:27017", "sports_knowledge_platform");
//! let conn = Connection::open(&conf).unwrap();
//! let interrupt = Interrupt::never();
//! let seeder = Seeder::new(&conn, &interrupt);
//! let summary = seeder.seed(&SeedOptions::new(".")).unwrap();
//! assert!(summary.is_success());
//! ```
//!
//! # Exporter example:
//! ```no_run
//! use mongo_fixture::{ConnConf, Connection, Dataset, Exporter, Interrupt};
//!
//! let conf = ConnConf::new("mongodb://localhost:27017", "sports_knowledge_platform");
//! let conn = Connection::open(&conf).unwrap();
//! let interrupt = Interrupt::never();
//! let exporter = Exporter::new(&conn, &interrupt);
//! let summary = exporter.export_all("./export", &Dataset::exported()).unwrap();
//! println!("exported {} documents", summary.total_exported());
//! ```

#![warn(missing_docs)]

#[doc(hidden)]
pub mod blocking;
pub mod catalog;
mod config;
pub mod credential;
mod error;
pub mod logging;

/// mongodb internal database for admin commands.
const ADMIN_DB_NAME: &str = "admin";
/// document identifier key.
const ID_KEY: &str = "_id";

/// compiled-in default connection string.
pub const DEFAULT_URI: &str = "mongodb://localhost:27017";
/// compiled-in default database name.
pub const DEFAULT_DATABASE: &str = "sports_knowledge_platform";
/// environment variable overriding the connection string.
pub const MONGODB_URI_ENV: &str = "MONGODB_URI";
/// environment variable overriding the database name.
pub const DATABASE_NAME_ENV: &str = "DATABASE_NAME";

pub use blocking::{
    Connection, Exporter, FixtureLayout, Interrupt, SeedOptions, Seeder, SupplementImporter,
};
pub use catalog::{Dataset, IndexSpec};
pub use config::{redact_uri, ConnArgs, ConnConf};
pub use error::{FixtureError, Result};
