//! Structured observability hooks for ingestion and record lifecycle events.
//!
//! This module provides:
//! - An ingestion-scoped tracing span carrying the registration number
//! - Emission functions for key lifecycle events: ingestion start, per-term
//!   outcome, ingestion finish, merge, rejection
//!
//! Events are emitted at `info!` level except per-term unavailability and
//! rejections, which are `warn!`.

use tracing::{info, warn};

/// Span tagged with the registration number being ingested. Use with
/// `tracing::Instrument` to carry it across await points.
pub fn ingest_span(registration_number: &str) -> tracing::Span {
    tracing::info_span!("transcript.ingest", registration = %registration_number)
}

/// Emit event: ingestion started for a registration number.
pub fn emit_ingest_started(registration_number: &str, max_terms: u8, concurrent: bool) {
    info!(
        event = "ingest.started",
        registration = %registration_number,
        max_terms = max_terms,
        concurrent = concurrent,
    );
}

/// Emit event: a term's payload was fetched and parsed.
pub fn emit_term_fetched(term: u8, endpoint: &str, items: usize) {
    info!(event = "ingest.term_fetched", term = term, endpoint = %endpoint, items = items);
}

/// Emit event: every candidate endpoint failed for a term.
pub fn emit_term_unavailable(term: u8, attempts: usize, last_error: &dyn std::fmt::Display) {
    warn!(
        event = "ingest.term_unavailable",
        term = term,
        attempts = attempts,
        error = %last_error,
    );
}

/// Emit event: ingestion finished with the number of usable terms.
pub fn emit_ingest_finished(registration_number: &str, terms_found: usize, duration_ms: u64) {
    info!(
        event = "ingest.finished",
        registration = %registration_number,
        terms_found = terms_found,
        duration_ms = duration_ms,
    );
}

/// Emit event: a record was merged and persisted.
pub fn emit_record_merged(owner_id: &str, terms: usize, cumulative_average: f64, provenance: &str) {
    info!(
        event = "record.merged",
        owner_id = %owner_id,
        terms = terms,
        cumulative_average = cumulative_average,
        provenance = %provenance,
    );
}

/// Emit event: a request was rejected before any mutation.
pub fn emit_record_rejected(owner_id: &str, error: &dyn std::fmt::Display) {
    warn!(event = "record.rejected", owner_id = %owner_id, error = %error);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_span_create() {
        let _entered = ingest_span("1CR24IS069").entered();
        emit_term_fetched(1, "https://example.test/results", 4);
    }
}
