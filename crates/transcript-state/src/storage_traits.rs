//! Storage trait definitions for Transcript
//!
//! These traits define the collaborators the record core consumes:
//! - `RecordStore`: whole-document persistence of `AcademicRecord`s
//! - `ProfileDirectory`: the owner's known registration number
//!
//! All traits are async and backend-agnostic. In-memory fakes are provided
//! for testing via the `fakes` module.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::schema::AcademicRecord;

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Academic record document store.
///
/// Guarantees:
/// - At most one record per `owner_id`.
/// - `upsert` replaces the whole document atomically (read-modify-write is
///   the caller's concern; concurrent writers are last-write-wins).
/// - `find` returns exactly what the last `upsert` stored.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Look up the record for an owner. `Ok(None)` if absent.
    async fn find(&self, owner_id: &str) -> StorageResult<Option<AcademicRecord>>;

    /// Insert or replace the record keyed by `record.owner_id`.
    async fn upsert(&self, record: &AcademicRecord) -> StorageResult<()>;

    /// Delete the record for an owner. Returns `StorageError::RecordNotFound`
    /// if absent.
    async fn delete(&self, owner_id: &str) -> StorageResult<()>;
}

/// Student profile directory (owned by the CRUD layer).
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    /// The registration number on file for an owner, if any.
    async fn registration_number(&self, owner_id: &str) -> StorageResult<Option<String>>;

    /// Record (or replace) the registration number on file for an owner.
    async fn set_registration_number(
        &self,
        owner_id: &str,
        registration_number: &str,
    ) -> StorageResult<()>;
}
