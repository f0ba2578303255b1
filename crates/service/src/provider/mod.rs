//! Persistence provider abstraction.
//!
//! The store delegates all storage to a provider injected at construction time.
//! Absence is reported as `Ok(None)`; failures as [`ProviderError`].

use async_trait::async_trait;

use crate::errors::ProviderError;
use crate::record::{Payload, Record, RecordId};

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileProvider;
pub use memory::MemoryProvider;

/// Record to be inserted; `id` is `None` when the provider is expected to assign one.
#[derive(Clone, Debug, PartialEq)]
pub struct NewRecord {
    pub id: Option<RecordId>,
    pub fields: Payload,
}

#[async_trait]
pub trait PersistenceProvider: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Record>, ProviderError>;
    async fn find_one(&self, id: &RecordId) -> Result<Option<Record>, ProviderError>;
    async fn insert(&self, record: NewRecord) -> Result<Record, ProviderError>;
    async fn remove_by_id(&self, id: &RecordId) -> Result<Option<Record>, ProviderError>;
    /// Replace the stored fields of `id`; returns the record as stored afterwards.
    async fn update_by_id(&self, id: &RecordId, record: Record) -> Result<Option<Record>, ProviderError>;

    /// Whether `insert` generates ids for records that arrive without one.
    fn assigns_ids(&self) -> bool { false }
}
