//! API key middleware.

use std::sync::Arc;

use axum::{extract::Request, extract::State, middleware::Next, response::IntoResponse, response::Response};
use subtle::ConstantTimeEq;

use crate::http::response::ApiError;

pub const API_KEY_HEADER: &str = "X-API-Key";

/// The configured key, shared by every request.
#[derive(Clone)]
pub struct ApiKey(pub Arc<str>);

pub async fn api_key_middleware(
    State(ApiKey(expected)): State<ApiKey>,
    request: Request,
    next: Next,
) -> Response {
    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .map(|value| value.as_bytes())
        .unwrap_or_default();

    if provided.ct_eq(expected.as_bytes()).into() {
        return next.run(request).await;
    }

    tracing::warn!(path = %request.uri().path(), "Rejected request with invalid api key");
    ApiError::forbidden("invalid api key").into_response()
}
