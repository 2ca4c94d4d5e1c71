//! Ingestion orchestrator
//!
//! Probes terms `1..=max_terms`, parses each payload and keeps the terms
//! that yield items. Unavailable or empty terms are logged and skipped;
//! only a run with no usable term at all fails, with `NoDataFound`. When the
//! overall deadline passes, the terms collected so far are kept and the rest
//! count as unavailable.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::task::JoinSet;
use tokio::time::Instant as TokioInstant;
use tracing::{debug, warn, Instrument, Span};
use transcript_core::{
    emit_ingest_finished, emit_ingest_started, emit_term_fetched, emit_term_unavailable,
    ingest_span, FetchedTerm, ResultsSource, SourceError,
};
use transcript_state::{normalize_registration, MAX_TERM_NUMBER};

use crate::config::ProbeConfig;
use crate::error::{FetchError, Result};
use crate::parser::parse_term;
use crate::prober::fetch_term;
use crate::transport::Transport;

/// Name reported as the source of ingested results
pub const SOURCE_NAME: &str = "results-portal";

/// Fetches and parses all published terms for a registration number
pub struct Ingestor<T> {
    config: Arc<ProbeConfig>,
    transport: Arc<T>,
}

impl<T: Transport + 'static> Ingestor<T> {
    pub fn new(config: ProbeConfig, transport: T) -> Self {
        Self {
            config: Arc::new(config),
            transport: Arc::new(transport),
        }
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Fetch every available term, ordered by term number.
    pub async fn fetch_all(&self, registration_number: &str) -> Result<Vec<FetchedTerm>> {
        let registration = normalize_registration(registration_number);
        if registration.is_empty() {
            return Err(FetchError::InvalidRegistration(
                registration_number.to_string(),
            ));
        }

        let span = ingest_span(&registration);
        self.fetch_all_inner(&registration).instrument(span).await
    }

    async fn fetch_all_inner(&self, registration: &str) -> Result<Vec<FetchedTerm>> {
        emit_ingest_started(registration, self.config.max_terms, self.config.concurrent);
        let started = Instant::now();
        let deadline = tokio::time::Instant::now() + self.config.deadline();

        let terms = if self.config.concurrent {
            self.collect_concurrent(registration, deadline).await
        } else {
            self.collect_sequential(registration, deadline).await
        };

        emit_ingest_finished(
            registration,
            terms.len(),
            started.elapsed().as_millis() as u64,
        );

        if terms.is_empty() {
            return Err(FetchError::NoDataFound {
                registration_number: registration.to_string(),
            });
        }
        Ok(terms)
    }

    fn term_range(&self) -> std::ops::RangeInclusive<u8> {
        1..=self.config.max_terms.min(MAX_TERM_NUMBER)
    }

    async fn collect_sequential(
        &self,
        registration: &str,
        deadline: TokioInstant,
    ) -> Vec<FetchedTerm> {
        let mut terms = Vec::new();
        for term in self.term_range() {
            let probe = fetch_one(&self.config, self.transport.as_ref(), registration, term);
            match tokio::time::timeout_at(deadline, probe).await {
                Ok(parsed) => terms.extend(parsed),
                Err(_) => {
                    self.cut_off(term..=*self.term_range().end());
                    break;
                }
            }
        }
        terms
    }

    async fn collect_concurrent(
        &self,
        registration: &str,
        deadline: TokioInstant,
    ) -> Vec<FetchedTerm> {
        let mut join_set = JoinSet::new();
        for term in self.term_range() {
            let config = Arc::clone(&self.config);
            let transport = Arc::clone(&self.transport);
            let registration = registration.to_string();
            join_set.spawn(
                async move {
                    let parsed = fetch_one(&config, transport.as_ref(), &registration, term).await;
                    (term, parsed)
                }
                .instrument(Span::current()),
            );
        }

        // Slots indexed by term number keep the output ordered regardless of
        // completion order.
        let term_count = usize::from(*self.term_range().end());
        let mut slots: Vec<Option<FetchedTerm>> = vec![None; term_count];
        let mut finished = vec![false; term_count];
        loop {
            match tokio::time::timeout_at(deadline, join_set.join_next()).await {
                Ok(Some(Ok((term, parsed)))) => {
                    let slot = usize::from(term) - 1;
                    slots[slot] = parsed;
                    finished[slot] = true;
                }
                Ok(Some(Err(e))) => warn!(%e, "term fetch task failed"),
                Ok(None) => break,
                Err(_) => {
                    join_set.abort_all();
                    let pending = self
                        .term_range()
                        .filter(|term| !finished[usize::from(*term) - 1]);
                    self.cut_off(pending);
                    break;
                }
            }
        }
        slots.into_iter().flatten().collect()
    }

    /// Log every term the deadline cut off as unavailable.
    fn cut_off(&self, terms: impl IntoIterator<Item = u8>) {
        let reason = FetchError::DeadlineExceeded {
            seconds: self.config.deadline().as_secs(),
        };
        for term in terms {
            emit_term_unavailable(term, 0, &reason);
        }
    }
}

/// Probe and parse one term; `None` when unavailable or empty.
async fn fetch_one<T>(
    config: &ProbeConfig,
    transport: &T,
    registration: &str,
    term: u8,
) -> Option<FetchedTerm>
where
    T: Transport + ?Sized,
{
    match fetch_term(config, transport, registration, term).await {
        Ok(hit) => {
            let parsed = parse_term(&hit.body, term);
            if parsed.items.is_empty() {
                debug!(term, endpoint = %hit.endpoint, "payload had no result rows");
                return None;
            }
            emit_term_fetched(term, &hit.endpoint, parsed.items.len());
            Some(parsed)
        }
        Err(err) => {
            let attempts = match &err {
                FetchError::TermUnavailable { attempts, .. } => *attempts,
                _ => 0,
            };
            emit_term_unavailable(term, attempts, &err);
            None
        }
    }
}

#[async_trait]
impl<T: Transport + 'static> ResultsSource for Ingestor<T> {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn fetch_all_terms(
        &self,
        registration_number: &str,
    ) -> std::result::Result<Vec<FetchedTerm>, SourceError> {
        self.fetch_all(registration_number)
            .await
            .map_err(SourceError::from)
    }
}
