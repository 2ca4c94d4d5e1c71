//! Error types for transcript-state

use thiserror::Error;

/// Errors that can occur in the record persistence layer
#[derive(Error, Debug)]
pub enum StorageError {
    /// No academic record exists for the owner
    #[error("academic record not found for owner: {owner_id}")]
    RecordNotFound { owner_id: String },

    /// Database connection error
    #[error("Database connection failed: {0}")]
    Connection(String),

    /// Database query error
    #[error("Database query failed: {0}")]
    Query(String),

    /// Serialization error
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Schema setup error
    #[error("Schema setup failed: {0}")]
    SchemaSetup(String),
}

impl From<surrealdb::Error> for StorageError {
    fn from(err: surrealdb::Error) -> Self {
        StorageError::Query(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}
