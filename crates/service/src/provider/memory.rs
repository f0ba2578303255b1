use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{NewRecord, PersistenceProvider};
use crate::errors::ProviderError;
use crate::record::{Record, RecordId};

/// In-memory fallback provider used when no durable backend is configured.
/// Keeps records in insertion order.
#[derive(Clone, Default)]
pub struct MemoryProvider {
    inner: Arc<RwLock<Vec<Record>>>,
}

impl MemoryProvider {
    pub fn new() -> Self { Self::default() }

    /// Start with a fixed set of records, e.g. demo data.
    pub fn with_records(records: Vec<Record>) -> Self {
        Self { inner: Arc::new(RwLock::new(records)) }
    }

    pub async fn len(&self) -> usize { self.inner.read().await.len() }

    pub async fn is_empty(&self) -> bool { self.inner.read().await.is_empty() }
}

#[async_trait]
impl PersistenceProvider for MemoryProvider {
    async fn find_all(&self) -> Result<Vec<Record>, ProviderError> {
        Ok(self.inner.read().await.clone())
    }

    async fn find_one(&self, id: &RecordId) -> Result<Option<Record>, ProviderError> {
        let records = self.inner.read().await;
        Ok(records.iter().find(|r| &r.id == id).cloned())
    }

    async fn insert(&self, record: NewRecord) -> Result<Record, ProviderError> {
        let id = record
            .id
            .ok_or_else(|| ProviderError::Backend("memory provider needs an id on insert".into()))?;
        let mut records = self.inner.write().await;
        if records.iter().any(|r| r.id == id) {
            return Err(ProviderError::Conflict(format!("id {} already exists", id)));
        }
        let stored = Record::new(id, record.fields);
        records.push(stored.clone());
        Ok(stored)
    }

    async fn remove_by_id(&self, id: &RecordId) -> Result<Option<Record>, ProviderError> {
        let mut records = self.inner.write().await;
        let pos = records.iter().position(|r| &r.id == id);
        Ok(pos.map(|i| records.remove(i)))
    }

    async fn update_by_id(&self, id: &RecordId, record: Record) -> Result<Option<Record>, ProviderError> {
        let mut records = self.inner.write().await;
        let Some(existing) = records.iter_mut().find(|r| &r.id == id) else { return Ok(None) };
        existing.fields = record.fields;
        Ok(Some(existing.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn new_record(id: &str, name: &str) -> NewRecord {
        let mut fields = serde_json::Map::new();
        fields.insert("name".into(), json!(name));
        NewRecord { id: Some(RecordId::parse(id).unwrap()), fields }
    }

    #[tokio::test]
    async fn memory_provider_keeps_insertion_order() -> Result<(), anyhow::Error> {
        let p = MemoryProvider::new();
        assert!(p.is_empty().await);
        p.insert(new_record("b", "second")).await?;
        p.insert(new_record("a", "first")).await?;
        let ids: Vec<_> = p.find_all().await?.into_iter().map(|r| r.id.to_string()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        Ok(())
    }

    #[tokio::test]
    async fn memory_provider_rejects_duplicate_and_missing_ids() {
        let p = MemoryProvider::new();
        p.insert(new_record("a", "x")).await.unwrap();
        assert!(matches!(p.insert(new_record("a", "y")).await, Err(ProviderError::Conflict(_))));
        let anonymous = NewRecord { id: None, fields: Default::default() };
        assert!(matches!(p.insert(anonymous).await, Err(ProviderError::Backend(_))));
        assert_eq!(p.len().await, 1);
    }

    #[tokio::test]
    async fn memory_provider_update_and_remove_absent_return_none() -> Result<(), anyhow::Error> {
        let p = MemoryProvider::new();
        let missing = RecordId::parse("nope")?;
        let rec = Record::new(missing.clone(), Default::default());
        assert!(p.update_by_id(&missing, rec).await?.is_none());
        assert!(p.remove_by_id(&missing).await?.is_none());
        Ok(())
    }
}
