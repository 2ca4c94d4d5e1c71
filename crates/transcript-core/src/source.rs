//! External results seam.
//!
//! The ingestion pipeline lives in `transcript-fetch`; the core only sees
//! the parsed per-term output through `ResultsSource`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Placeholder used for result text the markup did not provide.
pub const MISSING_TEXT: &str = "-";

/// One course row extracted from published results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchedItem {
    pub code: String,
    pub name: String,
    /// Numeric score, when a candidate cell parsed as an integer
    pub score: Option<u32>,
    pub credits: u32,
    /// Result column text (e.g. "P", "F"), or `-`
    pub result: String,
    /// Grade column text as printed, or `-`
    pub grade: String,
    pub attempt: String,
    pub passing_date: String,
}

/// Parsed results for one term
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchedTerm {
    pub term_number: u8,
    pub items: Vec<FetchedItem>,
    /// Provisional credit-weighted average over scored items, two decimals
    pub average: Option<f64>,
}

/// Failures a results source reports to the core.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("no published results found for {registration_number}")]
    NoDataFound { registration_number: String },

    #[error("invalid registration number: {0}")]
    InvalidRegistration(String),

    #[error("{0}")]
    Other(String),
}

/// A source of published term results for a registration number.
#[async_trait]
pub trait ResultsSource: Send + Sync {
    /// Human-readable name recorded as the provenance of fetched data.
    fn name(&self) -> &str;

    /// Fetch and parse every available term, ordered by term number.
    /// Fails with `SourceError::NoDataFound` when no term yields items.
    async fn fetch_all_terms(
        &self,
        registration_number: &str,
    ) -> std::result::Result<Vec<FetchedTerm>, SourceError>;
}
