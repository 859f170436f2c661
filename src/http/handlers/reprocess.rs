//! Manual reprocessing of a received payment.

use std::sync::Arc;

use axum::extract::State;
use axum::{Form, Json};
use serde::{Deserialize, Serialize};

use crate::http::handlers::RequestHandler;
use crate::http::response::ApiError;

#[derive(Debug, Deserialize)]
pub struct ReprocessRequest {
    pub operation_id: String,
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
pub struct ReprocessResponse {
    pub status: &'static str,
}

pub async fn reprocess(
    State(handler): State<Arc<RequestHandler>>,
    Form(request): Form<ReprocessRequest>,
) -> Result<Json<ReprocessResponse>, ApiError> {
    if request.operation_id.is_empty() {
        return Err(ApiError::bad_request(
            "missing_parameter",
            "operation_id is required",
        ));
    }
    let status = handler
        .listener()?
        .reprocess(&request.operation_id, request.force)
        .await?;
    tracing::info!(operation = %request.operation_id, force = request.force, status = %status, "Payment reprocessed");
    Ok(Json(ReprocessResponse {
        status: status.as_str(),
    }))
}
