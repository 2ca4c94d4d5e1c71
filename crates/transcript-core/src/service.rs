//! Record operations exposed to the CRUD/auth layer.
//!
//! `RecordService` owns the read-modify-write cycle around the merge engine:
//! validate, load, merge, persist. Writes for the same owner are serialized
//! within the process; across processes the store is last-write-wins.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, instrument, warn};
use transcript_state::{
    normalize_registration, AcademicRecord, ExamMonth, ProfileDirectory, Provenance, RecordStore,
    StorageError, Term, MAX_TERM_NUMBER,
};

use crate::error::{RecordError, Result};
use crate::merge::{ensure_registration, merge_terms, IncomingTerm};
use crate::obs::{emit_record_merged, emit_record_rejected};
use crate::source::{FetchedTerm, ResultsSource, SourceError};
use crate::validation::{
    validate_registration, validate_term, validate_terms, MIN_FETCH_REGISTRATION_LEN,
    MIN_MANUAL_REGISTRATION_LEN,
};

/// Per-term line of a record summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermSummary {
    pub term_number: u8,
    pub average: f64,
    pub item_count: usize,
    pub exam_month: Option<ExamMonth>,
    pub exam_year: Option<i32>,
}

/// Condensed view of a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSummary {
    pub registration_number: String,
    pub cumulative_average: f64,
    pub total_terms: usize,
    pub per_term: Vec<TermSummary>,
    pub last_updated: DateTime<Utc>,
}

impl From<&AcademicRecord> for RecordSummary {
    fn from(record: &AcademicRecord) -> Self {
        RecordSummary {
            registration_number: record.registration_number.clone(),
            cumulative_average: record.cumulative_average,
            total_terms: record.terms.len(),
            per_term: record
                .terms
                .iter()
                .map(|t| TermSummary {
                    term_number: t.number,
                    average: t.average,
                    item_count: t.items.len(),
                    exam_month: t.exam_month,
                    exam_year: t.exam_year,
                })
                .collect(),
            last_updated: record.last_updated,
        }
    }
}

/// Results read from an external source, not yet persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalResults {
    pub registration_number: String,
    pub per_term: Vec<FetchedTerm>,
    pub fetched_at: DateTime<Utc>,
    pub source: String,
}

/// Async mutexes keyed by owner id. An entry lives only while some request
/// for that owner holds or waits on it.
#[derive(Debug, Default)]
struct OwnerLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl OwnerLocks {
    async fn acquire(&self, owner_id: &str) -> OwnerGuard<'_> {
        let lock = {
            let mut locks = self.map();
            Arc::clone(locks.entry(owner_id.to_string()).or_default())
        };
        OwnerGuard {
            guard: Some(lock.lock_owned().await),
            owner_id: owner_id.to_string(),
            locks: self,
        }
    }

    fn map(&self) -> MutexGuard<'_, HashMap<String, Arc<AsyncMutex<()>>>> {
        self.locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Held lock for one owner; drops the map entry once nobody else uses it.
struct OwnerGuard<'a> {
    guard: Option<OwnedMutexGuard<()>>,
    owner_id: String,
    locks: &'a OwnerLocks,
}

impl Drop for OwnerGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        let mut locks = self.locks.map();
        let idle = locks
            .get(&self.owner_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1);
        if idle {
            locks.remove(&self.owner_id);
        }
    }
}

/// Thin API layer over a record store, a profile directory and a results
/// source.
pub struct RecordService<S, P, R> {
    store: S,
    profiles: P,
    source: R,
    locks: OwnerLocks,
}

impl<S, P, R> RecordService<S, P, R>
where
    S: RecordStore,
    P: ProfileDirectory,
    R: ResultsSource,
{
    pub fn new(store: S, profiles: P, source: R) -> Self {
        Self {
            store,
            profiles,
            source,
            locks: OwnerLocks::default(),
        }
    }

    /// The record for an owner.
    pub async fn get_record(&self, owner_id: &str) -> Result<AcademicRecord> {
        self.store
            .find(owner_id)
            .await?
            .ok_or_else(|| RecordError::RecordNotFound {
                owner_id: owner_id.to_string(),
            })
    }

    /// One term of an owner's record.
    pub async fn get_term(&self, owner_id: &str, term_number: u8) -> Result<Term> {
        let record = self.get_record(owner_id).await?;
        record
            .term(term_number)
            .cloned()
            .ok_or_else(|| RecordError::TermNotFound {
                owner_id: owner_id.to_string(),
                term: term_number,
            })
    }

    /// Summary of an owner's record.
    pub async fn get_summary(&self, owner_id: &str) -> Result<RecordSummary> {
        let record = self.get_record(owner_id).await?;
        Ok(RecordSummary::from(&record))
    }

    /// Merge manually entered terms into the owner's record, creating it on
    /// first submission. The registration number must match the owner's
    /// profile and, if a record exists, the record's own.
    #[instrument(skip(self, terms), fields(terms = terms.len()))]
    pub async fn submit_manual_terms(
        &self,
        owner_id: &str,
        registration_number: &str,
        terms: &[IncomingTerm],
    ) -> Result<AcademicRecord> {
        let result = self
            .submit_manual_terms_inner(owner_id, registration_number, terms)
            .await;
        if let Err(err) = &result {
            emit_record_rejected(owner_id, err);
        }
        result
    }

    async fn submit_manual_terms_inner(
        &self,
        owner_id: &str,
        registration_number: &str,
        terms: &[IncomingTerm],
    ) -> Result<AcademicRecord> {
        let registration = validate_registration(registration_number, MIN_MANUAL_REGISTRATION_LEN)?;
        validate_terms(terms)?;
        self.check_profile(owner_id, &registration).await?;

        let _guard = self.locks.acquire(owner_id).await;
        let record = match self.store.find(owner_id).await? {
            Some(existing) => {
                ensure_registration(&existing, &registration)?;
                existing
            }
            None => AcademicRecord::new(owner_id, &registration, Provenance::Manual),
        };

        let merged = merge_terms(&record, terms, Provenance::Manual);
        self.persist(&merged).await?;
        Ok(merged)
    }

    /// Merge one term into an existing record. The term number in the path
    /// wins over any number carried in `term`.
    #[instrument(skip(self, term))]
    pub async fn update_term(
        &self,
        owner_id: &str,
        term_number: u8,
        term: IncomingTerm,
    ) -> Result<AcademicRecord> {
        let mut term = term;
        term.number = term_number;

        if let Err(err) = validate_term(&term) {
            emit_record_rejected(owner_id, &err);
            return Err(err.into());
        }

        let _guard = self.locks.acquire(owner_id).await;
        let record = self.get_record(owner_id).await?;
        let provenance = record.provenance.clone();
        let merged = merge_terms(&record, std::slice::from_ref(&term), provenance);
        self.persist(&merged).await?;
        Ok(merged)
    }

    /// Fetch every published term for a registration number. Read-only.
    /// Terms numbered outside `1..=MAX_TERM_NUMBER` are dropped.
    #[instrument(skip(self))]
    pub async fn fetch_external(&self, registration_number: &str) -> Result<ExternalResults> {
        let registration = validate_registration(registration_number, MIN_FETCH_REGISTRATION_LEN)?;

        let mut per_term = self
            .source
            .fetch_all_terms(&registration)
            .await
            .map_err(|err| match err {
                SourceError::NoDataFound {
                    registration_number,
                } => RecordError::NoDataFound {
                    registration_number,
                },
                other => RecordError::Source(other.to_string()),
            })?;

        per_term.retain(|term| {
            let known = (1..=MAX_TERM_NUMBER).contains(&term.term_number);
            if !known {
                warn!(term = term.term_number, "dropping fetched term outside 1..=8");
            }
            known
        });
        if per_term.is_empty() {
            return Err(RecordError::NoDataFound {
                registration_number: registration,
            });
        }

        Ok(ExternalResults {
            registration_number: registration,
            per_term,
            fetched_at: Utc::now(),
            source: self.source.name().to_string(),
        })
    }

    /// Fetch every published term and merge it into the owner's record.
    #[instrument(skip(self))]
    pub async fn import_external(
        &self,
        owner_id: &str,
        registration_number: &str,
    ) -> Result<AcademicRecord> {
        let registration = validate_registration(registration_number, MIN_FETCH_REGISTRATION_LEN)?;
        self.check_profile(owner_id, &registration).await?;

        let external = self.fetch_external(&registration).await?;
        let incoming: Vec<IncomingTerm> = external
            .per_term
            .iter()
            .map(|t| IncomingTerm::from_fetched(t, external.fetched_at))
            .collect();

        let _guard = self.locks.acquire(owner_id).await;
        let record = match self.store.find(owner_id).await? {
            Some(existing) => {
                ensure_registration(&existing, &registration)?;
                existing
            }
            None => AcademicRecord::new(owner_id, &registration, Provenance::Automated),
        };

        let merged = merge_terms(&record, &incoming, Provenance::Automated);
        self.persist(&merged).await?;
        Ok(merged)
    }

    /// Delete the owner's record on request of the owning collaborator.
    #[instrument(skip(self))]
    pub async fn delete_record(&self, owner_id: &str) -> Result<()> {
        let _guard = self.locks.acquire(owner_id).await;
        self.store.delete(owner_id).await.map_err(|err| match err {
            StorageError::RecordNotFound { owner_id } => RecordError::RecordNotFound { owner_id },
            other => RecordError::Storage(other),
        })
    }

    async fn check_profile(&self, owner_id: &str, registration: &str) -> Result<()> {
        let on_file = self
            .profiles
            .registration_number(owner_id)
            .await?
            .map(|reg| normalize_registration(&reg))
            .ok_or_else(|| RecordError::ProfileNotFound {
                owner_id: owner_id.to_string(),
            })?;

        if on_file != registration {
            return Err(RecordError::RecordMismatch {
                expected: on_file,
                actual: registration.to_string(),
            });
        }
        Ok(())
    }

    async fn persist(&self, record: &AcademicRecord) -> Result<()> {
        self.store.upsert(record).await?;
        debug!(owner_id = %record.owner_id, "record persisted");
        emit_record_merged(
            &record.owner_id,
            record.terms.len(),
            record.cumulative_average,
            &record.provenance.to_string(),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn owner_lock_entries_are_released() {
        let locks = Arc::new(OwnerLocks::default());

        {
            let _a = locks.acquire("owner-a").await;
            let _b = locks.acquire("owner-b").await;
            assert_eq!(locks.map().len(), 2);
        }

        assert!(locks.map().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn waiting_request_keeps_the_entry_alive() {
        let locks = Arc::new(OwnerLocks::default());
        let first = locks.acquire("owner-a").await;

        let waiter = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.acquire("owner-a").await;
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        drop(first);
        assert_eq!(locks.map().len(), 1);

        waiter.await.unwrap();
        assert!(locks.map().is_empty());
    }
}
