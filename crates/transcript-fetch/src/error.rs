//! Error types for results ingestion

use thiserror::Error;
use transcript_core::SourceError;

/// Errors raised while probing endpoints or assembling terms
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport-level failure (connection, TLS, body decoding)
    #[error("HTTP error: {0}")]
    Http(String),

    /// A single attempt exceeded its timeout
    #[error("request to {url} timed out after {seconds}s")]
    Timeout { url: String, seconds: u64 },

    /// The endpoint answered with a blank body
    #[error("empty payload from {url}")]
    EmptyPayload { url: String },

    /// The endpoint answered with a non-success status
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    /// Every candidate endpoint failed for one term
    #[error("term {term} unavailable after {attempts} attempt(s)")]
    TermUnavailable { term: u8, attempts: usize },

    /// No term produced any items
    #[error("no published results found for {registration_number}")]
    NoDataFound { registration_number: String },

    #[error("invalid registration number: {0}")]
    InvalidRegistration(String),

    /// The ingestion deadline passed before the term finished
    #[error("ingestion deadline of {seconds}s passed")]
    DeadlineExceeded { seconds: u64 },
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Http(err.to_string())
    }
}

impl From<FetchError> for SourceError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::NoDataFound {
                registration_number,
            } => SourceError::NoDataFound {
                registration_number,
            },
            FetchError::InvalidRegistration(reg) => SourceError::InvalidRegistration(reg),
            other => SourceError::Other(other.to_string()),
        }
    }
}

/// Result type for ingestion operations
pub type Result<T> = std::result::Result<T, FetchError>;
