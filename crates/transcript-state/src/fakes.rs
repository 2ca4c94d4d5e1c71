//! In-memory fakes for storage traits (testing only)
//!
//! Provides `MemoryRecordStore` and `MemoryProfileDirectory` that satisfy the
//! trait contracts without any external dependencies.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::StorageError;
use crate::schema::{normalize_registration, AcademicRecord};
use crate::storage_traits::*;

// ---------------------------------------------------------------------------
// MemoryRecordStore
// ---------------------------------------------------------------------------

/// In-memory record store backed by a `HashMap<owner_id, AcademicRecord>`.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: Mutex<HashMap<String, AcademicRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn find(&self, owner_id: &str) -> StorageResult<Option<AcademicRecord>> {
        let records = self.records.lock().unwrap();
        Ok(records.get(owner_id).cloned())
    }

    async fn upsert(&self, record: &AcademicRecord) -> StorageResult<()> {
        let mut records = self.records.lock().unwrap();
        records.insert(record.owner_id.clone(), record.clone());
        Ok(())
    }

    async fn delete(&self, owner_id: &str) -> StorageResult<()> {
        let mut records = self.records.lock().unwrap();
        records
            .remove(owner_id)
            .map(|_| ())
            .ok_or_else(|| StorageError::RecordNotFound {
                owner_id: owner_id.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// MemoryProfileDirectory
// ---------------------------------------------------------------------------

/// In-memory profile directory backed by a `HashMap<owner_id, registration>`.
#[derive(Debug, Default)]
pub struct MemoryProfileDirectory {
    profiles: Mutex<HashMap<String, String>>,
}

impl MemoryProfileDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style seeding for tests
    pub fn with_profile(self, owner_id: &str, registration_number: &str) -> Self {
        self.profiles.lock().unwrap().insert(
            owner_id.to_string(),
            normalize_registration(registration_number),
        );
        self
    }
}

#[async_trait]
impl ProfileDirectory for MemoryProfileDirectory {
    async fn registration_number(&self, owner_id: &str) -> StorageResult<Option<String>> {
        let profiles = self.profiles.lock().unwrap();
        Ok(profiles.get(owner_id).cloned())
    }

    async fn set_registration_number(
        &self,
        owner_id: &str,
        registration_number: &str,
    ) -> StorageResult<()> {
        let mut profiles = self.profiles.lock().unwrap();
        profiles.insert(
            owner_id.to_string(),
            normalize_registration(registration_number),
        );
        Ok(())
    }
}
