use bson::document::ValueAccessError;
use mongodb::error::Error as MongoError;
use std::path::PathBuf;
use std::result::Result as StdResult;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Mongodb connection error")]
    MongoError(#[from] MongoError),
    #[error("Ping database failed, connection string: {uri:?}, detailed: {detail:?}")]
    ConnectError { uri: String, detail: MongoError },
    #[error("Bson value access error")]
    BsonError(#[from] ValueAccessError),
    #[error("Read or write file {path:?} failed")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Fixture file {path:?} is not valid json")]
    JsonError {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Fixture file {path:?} must contain a json array at top level")]
    NotAnArray { path: PathBuf },
    #[error("Fixture file {path:?} doesn't exist")]
    MissingFixture { path: PathBuf },
    #[error("Configuration file {path:?} is invalid")]
    ConfigError {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Unknown dataset or collection {0:?}")]
    UnknownDataset(String),
    #[error("Bcrypt error")]
    BcryptError(#[from] bcrypt::BcryptError),
    #[error("Generated password hash doesn't verify against its plaintext")]
    HashMismatch,
    #[error("Register interrupt handler failed")]
    SignalError(#[source] std::io::Error),
    #[error("Interrupted by operator")]
    Interrupted,
}

pub type Result<T> = StdResult<T, FixtureError>;
