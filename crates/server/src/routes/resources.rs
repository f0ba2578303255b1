use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use tracing::info;

use service::record::payload_from_value;
use service::{FieldFilter, Record, ResourceStore};

use crate::errors::JsonApiError;

/// `?field=value` becomes an equality filter; at most one pair is accepted,
/// counting repeated keys.
fn filter_from_query(q: Vec<(String, String)>) -> Result<Option<FieldFilter>, JsonApiError> {
    if q.len() > 1 {
        return Err(JsonApiError::bad_request("at most one filter field is supported"));
    }
    Ok(q.into_iter().next().map(|(field, value)| FieldFilter::new(field, value)))
}

pub async fn list(
    State(store): State<Arc<ResourceStore>>,
    Query(q): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<Record>>, JsonApiError> {
    let filter = filter_from_query(q)?;
    let records = store.list(filter.as_ref()).await?;
    info!(resource = store.name(), count = records.len(), "listed records");
    Ok(Json(records))
}

pub async fn get(
    State(store): State<Arc<ResourceStore>>,
    Path(id): Path<String>,
) -> Result<Json<Record>, JsonApiError> {
    Ok(Json(store.get(&id).await?))
}

pub async fn create(
    State(store): State<Arc<ResourceStore>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Record>), JsonApiError> {
    let Json(body) = body?;
    let created = store.create(payload_from_value(body)?).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update(
    State(store): State<Arc<ResourceStore>>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Record>, JsonApiError> {
    let Json(body) = body?;
    Ok(Json(store.update(&id, payload_from_value(body)?).await?))
}

pub async fn delete(
    State(store): State<Arc<ResourceStore>>,
    Path(id): Path<String>,
) -> Result<Json<Record>, JsonApiError> {
    Ok(Json(store.delete(&id).await?))
}
