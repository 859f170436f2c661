//! Trailing slash normalization.
//!
//! Runs before routing, so `/payment/` reaches the `/payment` route. `/admin/`
//! is left alone since it is the admin bundle index.

use axum::extract::Request;
use axum::http::uri::{PathAndQuery, Uri};

pub fn trim_trailing_slash(mut request: Request) -> Request {
    let path = request.uri().path();
    if path.len() <= 1 || !path.ends_with('/') || path == "/admin/" {
        return request;
    }

    let trimmed = path.trim_end_matches('/');
    let trimmed = if trimmed.is_empty() { "/" } else { trimmed };
    let path_and_query = match request.uri().query() {
        Some(query) => format!("{}?{}", trimmed, query),
        None => trimmed.to_string(),
    };

    let mut parts = request.uri().clone().into_parts();
    parts.path_and_query = match path_and_query.parse::<PathAndQuery>() {
        Ok(pq) => Some(pq),
        Err(_) => return request,
    };
    if let Ok(uri) = Uri::from_parts(parts) {
        *request.uri_mut() = uri;
    }
    request
}
