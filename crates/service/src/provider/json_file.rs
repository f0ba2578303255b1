use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use super::{NewRecord, PersistenceProvider};
use crate::errors::ProviderError;
use crate::record::{Payload, Record, RecordId};
use crate::storage::json_map_store::JsonMapStore;

/// Durable provider persisting one resource as a JSON object `{ "<id>": { fields } }`.
///
/// Generates 24-character hex ids for records inserted without one.
#[derive(Clone)]
pub struct JsonFileProvider {
    store: JsonMapStore<RecordId, Payload>,
    path: PathBuf,
}

impl JsonFileProvider {
    pub async fn open<P: Into<PathBuf>>(path: P) -> Result<Self, ProviderError> {
        let path = path.into();
        let store = JsonMapStore::open(path.clone()).await?;
        Ok(Self { store, path })
    }

    fn generate_id() -> Result<RecordId, ProviderError> {
        let hex = Uuid::new_v4().simple().to_string();
        RecordId::parse(&hex[..24]).map_err(|e| ProviderError::Backend(e.to_string()))
    }
}

#[async_trait]
impl PersistenceProvider for JsonFileProvider {
    async fn find_all(&self) -> Result<Vec<Record>, ProviderError> {
        Ok(self.store.list().await.into_iter().map(|(id, fields)| Record::new(id, fields)).collect())
    }

    async fn find_one(&self, id: &RecordId) -> Result<Option<Record>, ProviderError> {
        Ok(self.store.get(id).await.map(|fields| Record::new(id.clone(), fields)))
    }

    async fn insert(&self, record: NewRecord) -> Result<Record, ProviderError> {
        let id = match record.id {
            Some(id) => id,
            None => Self::generate_id()?,
        };
        let fields = record.fields;
        let stored = Record::new(id.clone(), fields.clone());
        self.store
            .update_map(move |map| {
                if map.contains_key(&id) {
                    return Err(ProviderError::Conflict(format!("id {} already exists", id)));
                }
                map.insert(id, fields);
                Ok(())
            })
            .await?;
        debug!(path = %self.path.display(), id = %stored.id, "json_file_insert");
        Ok(stored)
    }

    async fn remove_by_id(&self, id: &RecordId) -> Result<Option<Record>, ProviderError> {
        Ok(self.store.remove(id).await?.map(|fields| Record::new(id.clone(), fields)))
    }

    async fn update_by_id(&self, id: &RecordId, record: Record) -> Result<Option<Record>, ProviderError> {
        let fields = record.fields;
        self.store
            .update_map(|map| {
                Ok(map.get_mut(id).map(|existing| {
                    *existing = fields;
                    Record::new(id.clone(), existing.clone())
                }))
            })
            .await
    }

    fn assigns_ids(&self) -> bool { true }
}
