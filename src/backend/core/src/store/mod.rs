//! Storage collaborator.
//!
//! A [`RecordStore`] accepts a compiled predicate and returns the matching
//! records; it owns data access entirely. [`InMemoryStore`] is the bundled
//! implementation used by the development server and tests.

pub mod memory;

pub use memory::InMemoryStore;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::error::{ErrorCode, TesseraError};
use crate::filter::CompiledPredicate;
use crate::schema::Entity;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: Uuid },

    #[error("{entity} already exists: {key}")]
    Duplicate { entity: &'static str, key: Uuid },

    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl From<StoreError> for TesseraError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound { entity, key } => TesseraError::not_found(entity, key.to_string()),
            StoreError::Duplicate { .. } => {
                let message = error.to_string();
                TesseraError::new(ErrorCode::DuplicateRecord, message).with_source(error)
            }
            StoreError::Backend(ref detail) => {
                let detail = detail.clone();
                TesseraError::with_internal(ErrorCode::StorageError, "Storage operation failed", detail)
                    .with_source(error)
            }
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Persistence for one entity type.
#[async_trait]
pub trait RecordStore<E: Entity>: Send + Sync {
    /// Records satisfying `predicate`, in insertion order.
    async fn find(&self, predicate: &CompiledPredicate<E>) -> StoreResult<Vec<E>>;

    async fn get(&self, key: Uuid) -> StoreResult<E>;

    async fn insert(&self, record: E) -> StoreResult<E>;

    /// Replace the record with the same key.
    async fn update(&self, record: E) -> StoreResult<E>;

    async fn delete(&self, key: Uuid) -> StoreResult<()>;
}
