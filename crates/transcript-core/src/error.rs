//! Error taxonomy for the record core.

use transcript_state::StorageError;

/// Field-level failures in manually entered term data.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("registration number {value:?} is shorter than {min} characters")]
    RegistrationTooShort { value: String, min: usize },

    #[error("at least one term is required")]
    NoTerms,

    #[error("term number {number} is outside 1..={max}")]
    TermOutOfRange { number: u8, max: u8 },

    #[error("term {term}: item #{index} is missing required field `{field}`")]
    MissingField {
        term: u8,
        index: usize,
        field: &'static str,
    },

    #[error("term {term}: item {code} must carry a positive credit weight")]
    NonPositiveCredits { term: u8, code: String },

    #[error("term {term}: item {code} field `{field}` is {value}, above the maximum of {max}")]
    ScoreOutOfRange {
        term: u8,
        code: String,
        field: &'static str,
        value: u32,
        max: u32,
    },
}

/// Errors surfaced by record operations.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("academic record not found for owner {owner_id}")]
    RecordNotFound { owner_id: String },

    #[error("student profile not found for owner {owner_id}")]
    ProfileNotFound { owner_id: String },

    #[error("term {term} not found for owner {owner_id}")]
    TermNotFound { owner_id: String, term: u8 },

    #[error("registration number mismatch: expected {expected}, got {actual}")]
    RecordMismatch { expected: String, actual: String },

    #[error(
        "no results found for {registration_number}; check the registration number or wait until results are published"
    )]
    NoDataFound { registration_number: String },

    #[error("results source error: {0}")]
    Source(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl RecordError {
    /// Whether the failure was caused by the caller's input or a missing
    /// resource (4xx-equivalent), as opposed to an infrastructure fault.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, RecordError::Source(_) | RecordError::Storage(_))
    }

    /// Whether the failure is one of the not-found kinds.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RecordError::RecordNotFound { .. }
                | RecordError::ProfileNotFound { .. }
                | RecordError::TermNotFound { .. }
        )
    }
}

/// Result type for record operations.
pub type Result<T> = std::result::Result<T, RecordError>;
