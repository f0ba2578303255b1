use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use service::exchange::{Conversion, ConversionRequest, ExchangeService};

use crate::errors::JsonApiError;

pub async fn convert(
    State(svc): State<Arc<ExchangeService>>,
    req: Result<Json<ConversionRequest>, JsonRejection>,
) -> Result<Json<Conversion>, JsonApiError> {
    let Json(req) = req?;
    Ok(Json(svc.convert_amount(req).await?))
}
