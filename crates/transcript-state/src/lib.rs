//! Transcript-State: Academic Record Persistence
//!
//! This crate provides the persistence layer for Transcript. It owns the
//! record schema and the storage seams the record core writes through.
//!
//! ## Layer 0 - Data/Persistence
//!
//! Focus: Whole-document integrity of one record per owner.
//!
//! ## Key Components
//!
//! - `AcademicRecord` / `Term` / `Item`: the persisted document
//! - `RecordStore` / `ProfileDirectory`: backend-agnostic storage traits
//! - `SurrealHandle`: Manages the SurrealDB connection
//! - `fakes`: in-memory implementations for tests

mod error;
pub mod fakes;
mod handle;
mod schema;
pub mod storage_traits;
pub mod surreal_store;

pub use error::StorageError;
pub use handle::{CloudConfig, SurrealHandle};
pub use schema::{
    normalize_registration, AcademicRecord, ExamMonth, Grade, Item, Provenance, Term,
    MAX_COMPONENT_SCORE, MAX_TERM_NUMBER, MAX_TOTAL_SCORE,
};
pub use storage_traits::{ProfileDirectory, RecordStore, StorageResult};
pub use surreal_store::{SurrealProfileDirectory, SurrealRecordStore};
