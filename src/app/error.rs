use thiserror::Error;

use crate::config::ConfigError;
use crate::seedlist::SeedListError;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network error fetching {feed_id}: {source}")]
    NetworkFailure {
        feed_id: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to parse feed {feed_id}: {reason}")]
    ParseFailure { feed_id: String, reason: String },

    #[error("Timed out fetching {feed_id}")]
    Timeout { feed_id: String },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Watermark already exists for {0}")]
    AlreadyExists(String),

    #[error("No watermark for {0}")]
    NotFound(String),

    #[error("Stored timestamp for {feed_id} is not a valid datetime: {value}")]
    InvalidTimestamp { feed_id: String, value: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Database connection lock poisoned")]
    Poisoned,
}

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Could not connect to queue server: {0}")]
    ConnectFailure(String),

    #[error("Login rejected: {0}")]
    AuthFailure(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Server refused to queue {id}: {reason}")]
    Rejected { id: String, reason: String },

    #[error("Timed out waiting for {0}")]
    Timeout(&'static str),

    #[error("Queue connection not configured: {0}")]
    NotConfigured(#[from] ConfigError),
}

#[derive(Error, Debug)]
pub enum FeederError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    SeedList(#[from] SeedListError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<rusqlite::Error> for FeederError {
    fn from(e: rusqlite::Error) -> Self {
        FeederError::Store(StoreError::Database(e))
    }
}

pub type Result<T> = std::result::Result<T, FeederError>;
