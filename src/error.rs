//! Error types for asset_store

use thiserror::Error;

/// Result type alias for asset_store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in asset_store operations
#[derive(Error, Debug)]
pub enum Error {
    /// Empty or malformed identifier, token, or record rejected before any backend call
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A lookup expected to be unique matched more than one record
    #[error("Ambiguous state: {count} records for key {key}")]
    Ambiguous { key: String, count: usize },

    #[error("Token expired: {0}")]
    Expired(String),

    /// A stored record did not decode into the expected shape
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid table file: {0}")]
    InvalidFile(String),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// True for the lookup-miss kind, as opposed to expiry or backend failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    pub fn is_expired(&self) -> bool {
        matches!(self, Error::Expired(_))
    }
}
