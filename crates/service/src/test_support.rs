#![cfg(test)]
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::ProviderError;
use crate::provider::{NewRecord, PersistenceProvider};
use crate::record::{Payload, Record, RecordId};
use crate::store::IdGenerator;

pub fn payload(v: Value) -> Payload {
    v.as_object().cloned().unwrap_or_default()
}

/// Ids `<prefix>1`, `<prefix>2`, ...
pub fn sequential_ids(prefix: &str) -> IdGenerator {
    let prefix = prefix.to_string();
    let counter = Arc::new(AtomicU64::new(0));
    Arc::new(move || {
        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
        RecordId::parse(&format!("{}{}", prefix, n)).expect("valid generated id")
    })
}

/// Provider whose every call fails, standing in for an unreachable backend.
pub struct FailingProvider;

fn down() -> ProviderError { ProviderError::Backend("connection refused".into()) }

#[async_trait]
impl PersistenceProvider for FailingProvider {
    async fn find_all(&self) -> Result<Vec<Record>, ProviderError> { Err(down()) }
    async fn find_one(&self, _id: &RecordId) -> Result<Option<Record>, ProviderError> { Err(down()) }
    async fn insert(&self, _record: NewRecord) -> Result<Record, ProviderError> { Err(down()) }
    async fn remove_by_id(&self, _id: &RecordId) -> Result<Option<Record>, ProviderError> { Err(down()) }
    async fn update_by_id(&self, _id: &RecordId, _record: Record) -> Result<Option<Record>, ProviderError> { Err(down()) }
}
