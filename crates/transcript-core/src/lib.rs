//! Transcript Core Library
//!
//! Grade derivation, term and cumulative aggregation, the record merge
//! engine, and the record operations exposed to the wrapping CRUD layer.
//!
//! ## Layer 1 - Domain
//!
//! Everything here except [`service`] is synchronous and CPU-only.

pub mod aggregate;
pub mod error;
pub mod grade;
pub mod merge;
pub mod obs;
pub mod service;
pub mod source;
pub mod telemetry;
pub mod validation;

pub use aggregate::{cumulative_average, round2, term_average, weighted_average};
pub use error::{RecordError, Result, ValidationError};
pub use grade::grade_of;
pub use merge::{ensure_registration, merge_term, merge_terms, IncomingItem, IncomingTerm};
pub use obs::{
    emit_ingest_finished, emit_ingest_started, emit_record_merged, emit_record_rejected,
    emit_term_fetched, emit_term_unavailable, ingest_span,
};
pub use service::{ExternalResults, RecordService, RecordSummary, TermSummary};
pub use source::{FetchedItem, FetchedTerm, ResultsSource, SourceError, MISSING_TEXT};
pub use telemetry::init_tracing;
pub use validation::{
    validate_registration, validate_term, validate_terms, MIN_FETCH_REGISTRATION_LEN,
    MIN_MANUAL_REGISTRATION_LEN,
};

pub use transcript_state::{
    AcademicRecord, ExamMonth, Grade, Item, Provenance, Term, MAX_TERM_NUMBER,
};

/// Transcript version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
