use std::sync::Arc;

use async_trait::async_trait;

use crate::schema::AcademicRecord;
use crate::storage_traits::{ProfileDirectory, RecordStore, StorageResult};
use crate::SurrealHandle;

/// SurrealDB-backed implementation of the RecordStore trait.
#[derive(Clone)]
pub struct SurrealRecordStore {
    handle: Arc<SurrealHandle>,
}

impl SurrealRecordStore {
    pub fn new(handle: Arc<SurrealHandle>) -> Self {
        Self { handle }
    }
}

#[async_trait]
impl RecordStore for SurrealRecordStore {
    async fn find(&self, owner_id: &str) -> StorageResult<Option<AcademicRecord>> {
        self.handle.load_record(owner_id).await
    }

    async fn upsert(&self, record: &AcademicRecord) -> StorageResult<()> {
        self.handle.save_record(record).await
    }

    async fn delete(&self, owner_id: &str) -> StorageResult<()> {
        self.handle.delete_record(owner_id).await
    }
}

/// SurrealDB-backed implementation of the ProfileDirectory trait.
#[derive(Clone)]
pub struct SurrealProfileDirectory {
    handle: Arc<SurrealHandle>,
}

impl SurrealProfileDirectory {
    pub fn new(handle: Arc<SurrealHandle>) -> Self {
        Self { handle }
    }
}

#[async_trait]
impl ProfileDirectory for SurrealProfileDirectory {
    async fn registration_number(&self, owner_id: &str) -> StorageResult<Option<String>> {
        self.handle.load_profile(owner_id).await
    }

    async fn set_registration_number(
        &self,
        owner_id: &str,
        registration_number: &str,
    ) -> StorageResult<()> {
        self.handle
            .save_profile(owner_id, registration_number)
            .await
    }
}
