//! Generic CRUD façade over a [`PersistenceProvider`].
//!
//! The store validates caller input, assigns ids when the provider does not,
//! and re-signals provider outcomes as [`ServiceError`] kinds. It keeps no state
//! of its own beyond the injected provider.

use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::{ProviderError, ServiceError};
use crate::provider::{MemoryProvider, NewRecord, PersistenceProvider};
use crate::record::{take_id, FieldFilter, Payload, Record, RecordId};
use crate::schema::ResourceSchema;

/// Produces ids for records created without one on providers that do not assign ids.
pub type IdGenerator = Arc<dyn Fn() -> RecordId + Send + Sync>;

fn uuid_ids() -> IdGenerator {
    Arc::new(|| RecordId::from(Uuid::new_v4()))
}

#[derive(Clone)]
pub struct ResourceStore {
    schema: ResourceSchema,
    provider: Arc<dyn PersistenceProvider>,
    next_id: IdGenerator,
}

impl ResourceStore {
    pub fn new(schema: ResourceSchema, provider: Arc<dyn PersistenceProvider>) -> Self {
        Self { schema, provider, next_id: uuid_ids() }
    }

    /// Store backed by the in-memory fallback provider.
    pub fn in_memory(schema: ResourceSchema) -> Self {
        Self::new(schema, Arc::new(MemoryProvider::new()))
    }

    /// Replace the id generator used when neither caller nor provider supplies an id.
    pub fn with_id_generator(mut self, next_id: IdGenerator) -> Self {
        self.next_id = next_id;
        self
    }

    pub fn name(&self) -> &str { &self.schema.name }

    fn upstream(&self, op: &'static str, e: ProviderError) -> ServiceError {
        let err = ServiceError::from(e);
        if let ServiceError::Upstream(msg) = &err {
            warn!(resource = %self.schema.name, op, error = %msg, "provider_failure");
        }
        err
    }

    fn not_found(&self, id: &RecordId) -> ServiceError {
        ServiceError::not_found(&self.schema.name, id.as_str())
    }

    /// All records, or only those matching `filter`, in provider order.
    #[instrument(skip(self), fields(resource = %self.schema.name))]
    pub async fn list(&self, filter: Option<&FieldFilter>) -> Result<Vec<Record>, ServiceError> {
        let all = self.provider.find_all().await.map_err(|e| self.upstream("list", e))?;
        Ok(match filter {
            Some(f) => all.into_iter().filter(|r| f.matches(r)).collect(),
            None => all,
        })
    }

    #[instrument(skip(self), fields(resource = %self.schema.name))]
    pub async fn get(&self, id: &str) -> Result<Record, ServiceError> {
        let id = RecordId::parse(id)?;
        self.provider
            .find_one(&id)
            .await
            .map_err(|e| self.upstream("get", e))?
            .ok_or_else(|| self.not_found(&id))
    }

    #[instrument(skip(self, payload), fields(resource = %self.schema.name))]
    pub async fn create(&self, mut payload: Payload) -> Result<Record, ServiceError> {
        let explicit = take_id(&mut payload)?;
        self.schema.validate(&payload)?;
        let id = match explicit {
            Some(id) => Some(id),
            None if self.provider.assigns_ids() => None,
            None => Some((self.next_id)()),
        };
        let created = self
            .provider
            .insert(NewRecord { id, fields: payload })
            .await
            .map_err(|e| self.upstream("create", e))?;
        info!(resource = %self.schema.name, id = %created.id, "record_created");
        Ok(created)
    }

    /// Merge `payload` into the record `id`. A payload `id` must match the target.
    #[instrument(skip(self, payload), fields(resource = %self.schema.name))]
    pub async fn update(&self, id: &str, mut payload: Payload) -> Result<Record, ServiceError> {
        let id = RecordId::parse(id)?;
        if let Some(other) = take_id(&mut payload)? {
            if other != id {
                return Err(ServiceError::invalid(format!("payload id {} does not match {}", other, id)));
            }
        }
        let mut record = self
            .provider
            .find_one(&id)
            .await
            .map_err(|e| self.upstream("update", e))?
            .ok_or_else(|| self.not_found(&id))?;
        record.merge(payload);
        self.schema.validate(&record.fields)?;
        let updated = self
            .provider
            .update_by_id(&id, record)
            .await
            .map_err(|e| self.upstream("update", e))?
            .ok_or_else(|| self.not_found(&id))?;
        info!(resource = %self.schema.name, id = %updated.id, "record_updated");
        Ok(updated)
    }

    /// Remove the record `id` and return it.
    #[instrument(skip(self), fields(resource = %self.schema.name))]
    pub async fn delete(&self, id: &str) -> Result<Record, ServiceError> {
        let id = RecordId::parse(id)?;
        let removed = self
            .provider
            .remove_by_id(&id)
            .await
            .map_err(|e| self.upstream("delete", e))?
            .ok_or_else(|| self.not_found(&id))?;
        info!(resource = %self.schema.name, id = %removed.id, "record_deleted");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::provider::JsonFileProvider;
    use crate::test_support::{payload, sequential_ids, FailingProvider};
    use serde_json::json;

    fn items() -> ResourceStore {
        ResourceStore::in_memory(ResourceSchema::new("items").require(["name"]))
    }

    #[tokio::test]
    async fn create_then_get_with_assigned_id() -> Result<(), anyhow::Error> {
        let store = items().with_id_generator(sequential_ids("a"));
        let created = store.create(payload(json!({"name": "Widget", "qty": 5}))).await?;
        assert_eq!(created.id.as_str(), "a1");

        let found = store.get("a1").await?;
        assert_eq!(found, created);
        assert_eq!(serde_json::to_value(&found)?, json!({"id": "a1", "name": "Widget", "qty": 5}));
        Ok(())
    }

    #[tokio::test]
    async fn absent_ids_are_not_found() {
        let store = items();
        for res in [
            store.get("missing-id").await,
            store.update("missing-id", payload(json!({"qty": 1}))).await,
            store.delete("missing-id").await,
        ] {
            assert_eq!(res.unwrap_err().kind(), ErrorKind::NotFound);
        }
    }

    #[tokio::test]
    async fn malformed_ids_are_rejected_before_backend() {
        let store = ResourceStore::new(ResourceSchema::new("items"), Arc::new(FailingProvider));
        for bad in ["", " ", "a b", "x/y"] {
            assert_eq!(store.get(bad).await.unwrap_err().kind(), ErrorKind::InvalidArgument);
            assert_eq!(store.delete(bad).await.unwrap_err().kind(), ErrorKind::InvalidArgument);
            assert_eq!(store.update(bad, Payload::new()).await.unwrap_err().kind(), ErrorKind::InvalidArgument);
        }
    }

    #[tokio::test]
    async fn delete_is_durable() -> Result<(), anyhow::Error> {
        let store = items();
        let created = store.create(payload(json!({"name": "Item One", "qty": 100}))).await?;
        let removed = store.delete(created.id.as_str()).await?;
        assert_eq!(removed, created);
        assert_eq!(store.get(created.id.as_str()).await.unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(store.delete(created.id.as_str()).await.unwrap_err().kind(), ErrorKind::NotFound);
        Ok(())
    }

    #[tokio::test]
    async fn update_preserves_id_and_applies_fields() -> Result<(), anyhow::Error> {
        let store = items();
        let created = store.create(payload(json!({"name": "Item Two", "qty": 50}))).await?;
        let id = created.id.to_string();

        let updated = store.update(&id, payload(json!({"qty": 49, "description": "This is item two"}))).await?;
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.field("qty"), Some(&json!(49)));
        assert_eq!(updated.field("description"), Some(&json!("This is item two")));
        assert_eq!(updated.field("name"), Some(&json!("Item Two")));
        assert_eq!(store.get(&id).await?, updated);

        // same id in payload is fine, a different one is not
        store.update(&id, payload(json!({"id": id.clone(), "qty": 1}))).await?;
        let err = store.update(&id, payload(json!({"id": "other"}))).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        // cannot clear a required field
        let err = store.update(&id, payload(json!({"name": null}))).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        Ok(())
    }

    #[tokio::test]
    async fn list_counts_and_filters() -> Result<(), anyhow::Error> {
        let store = ResourceStore::in_memory(ResourceSchema::new("users").require(["name"]));
        assert!(store.list(None).await?.is_empty());

        for name in ["Thiago", "Ana", "Thiago"] {
            store.create(payload(json!({"name": name}))).await?;
        }
        assert_eq!(store.list(None).await?.len(), 3);

        let thiagos = store.list(Some(&FieldFilter::new("name", "Thiago"))).await?;
        assert_eq!(thiagos.len(), 2);
        assert!(thiagos.iter().all(|r| r.field("name") == Some(&json!("Thiago"))));
        assert!(store.list(Some(&FieldFilter::new("name", "Nobody"))).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn create_validates_required_fields_and_explicit_ids() -> Result<(), anyhow::Error> {
        let store = ResourceStore::in_memory(ResourceSchema::new("tasks").require(["name"]));
        assert_eq!(store.create(Payload::new()).await.unwrap_err().kind(), ErrorKind::InvalidArgument);

        let created = store.create(payload(json!({"id": 0, "name": "Thiago"}))).await?;
        assert_eq!(created.id.as_str(), "0");
        let dup = store.create(payload(json!({"id": "0", "name": "Again"}))).await.unwrap_err();
        assert_eq!(dup.kind(), ErrorKind::InvalidArgument);
        Ok(())
    }

    #[tokio::test]
    async fn provider_failures_surface_as_upstream() {
        let store = ResourceStore::new(ResourceSchema::new("items"), Arc::new(FailingProvider));
        assert_eq!(store.list(None).await.unwrap_err().kind(), ErrorKind::Upstream);
        assert_eq!(store.get("a1").await.unwrap_err().kind(), ErrorKind::Upstream);
        assert_eq!(store.create(payload(json!({"name": "x"}))).await.unwrap_err().kind(), ErrorKind::Upstream);
        assert_eq!(store.update("a1", Payload::new()).await.unwrap_err().kind(), ErrorKind::Upstream);
        assert_eq!(store.delete("a1").await.unwrap_err().kind(), ErrorKind::Upstream);
    }

    #[tokio::test]
    async fn provider_assigned_ids_are_used() -> Result<(), anyhow::Error> {
        let path = std::env::temp_dir().join(format!("store_items_{}.json", Uuid::new_v4()));
        let provider = JsonFileProvider::open(&path).await?;
        let store = ResourceStore::new(ResourceSchema::new("items"), Arc::new(provider))
            .with_id_generator(sequential_ids("never-"));
        let created = store.create(payload(json!({"name": "Widget"}))).await?;
        assert_eq!(created.id.as_str().len(), 24);
        assert_eq!(store.get(created.id.as_str()).await?, created);
        let _ = tokio::fs::remove_file(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn failed_write_does_not_leave_a_phantom_record() -> Result<(), anyhow::Error> {
        let dir = std::env::temp_dir().join(format!("store_unwritable_{}", Uuid::new_v4()));
        let provider = JsonFileProvider::open(dir.join("items.json")).await?;
        let store = ResourceStore::new(ResourceSchema::new("items").require(["name"]), Arc::new(provider));
        let kept = store.create(payload(json!({"id": "k1", "name": "Kept"}))).await?;

        tokio::fs::remove_dir_all(&dir).await?;

        let err = store.create(payload(json!({"id": "p1", "name": "Widget"}))).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Upstream);
        assert_eq!(store.get("p1").await.unwrap_err().kind(), ErrorKind::NotFound);

        assert_eq!(store.delete("k1").await.unwrap_err().kind(), ErrorKind::Upstream);
        assert_eq!(store.get("k1").await?, kept);

        // once the directory is back the same create goes through
        tokio::fs::create_dir_all(&dir).await?;
        let created = store.create(payload(json!({"id": "p1", "name": "Widget"}))).await?;
        assert_eq!(store.get("p1").await?, created);

        let _ = tokio::fs::remove_dir_all(&dir).await;
        Ok(())
    }
}
