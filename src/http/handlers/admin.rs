//! Read-only admin endpoints.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;

use crate::db::entity::{received_payment, sent_transaction};
use crate::db::Pagination;
use crate::http::handlers::RequestHandler;
use crate::http::response::ApiError;

pub async fn received_payments(
    State(handler): State<Arc<RequestHandler>>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Vec<received_payment::Model>>, ApiError> {
    let rows = handler.repository()?.received_payments(pagination).await?;
    Ok(Json(rows))
}

pub async fn received_payment(
    State(handler): State<Arc<RequestHandler>>,
    Path(id): Path<i32>,
) -> Result<Json<received_payment::Model>, ApiError> {
    handler
        .repository()?
        .received_payment(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("received payment {} not found", id)))
}

pub async fn sent_transactions(
    State(handler): State<Arc<RequestHandler>>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Vec<sent_transaction::Model>>, ApiError> {
    let rows = handler.repository()?.sent_transactions(pagination).await?;
    Ok(Json(rows))
}
