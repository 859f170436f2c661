//! Admin GUI delivery.
//!
//! Release builds serve the bundle compiled into the binary. In develop mode
//! unmatched GET requests are proxied to the GUI development server instead.

use axum::body::Body;
use axum::extract::{Path, Request};
use axum::http::{header, Method, Uri};
use axum::response::{IntoResponse, Redirect, Response};
use hyper::body::Incoming;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;

use crate::http::response::ApiError;

/// A file of the embedded bundle.
pub struct GuiAsset {
    pub path: &'static str,
    pub content_type: &'static str,
    pub body: &'static [u8],
}

static ASSETS: &[GuiAsset] = &[
    GuiAsset {
        path: "index.html",
        content_type: "text/html; charset=utf-8",
        body: include_bytes!("gui/index.html"),
    },
    GuiAsset {
        path: "app.js",
        content_type: "application/javascript",
        body: include_bytes!("gui/app.js"),
    },
    GuiAsset {
        path: "style.css",
        content_type: "text/css",
        body: include_bytes!("gui/style.css"),
    },
];

/// Find `path` (relative to `/admin/`) in the bundle. Empty means the index.
pub fn lookup(path: &str) -> Option<&'static GuiAsset> {
    let path = match path.trim_start_matches('/') {
        "" => "index.html",
        other => other,
    };
    ASSETS.iter().find(|asset| asset.path == path)
}

fn serve(path: &str) -> Response {
    match lookup(path) {
        Some(asset) => ([(header::CONTENT_TYPE, asset.content_type)], asset.body).into_response(),
        None => ApiError::not_found(format!("/admin/{} not found", path)).into_response(),
    }
}

pub async fn admin_redirect() -> Redirect {
    Redirect::permanent("/admin/")
}

pub async fn admin_index() -> Response {
    serve("")
}

pub async fn admin_asset(Path(path): Path<String>) -> Response {
    serve(&path)
}

/// Reverse proxy to the GUI development server.
#[derive(Clone)]
pub struct DevProxy {
    base: String,
    client: Client<HttpConnector, Body>,
}

impl DevProxy {
    pub fn new(develop_server: &str) -> Self {
        Self {
            base: develop_server.trim_end_matches('/').to_string(),
            client: Client::builder(TokioExecutor::new()).build(HttpConnector::new()),
        }
    }

    /// Forward a GET request; anything else is not found.
    pub async fn forward(self, request: Request) -> Response {
        if request.method() != Method::GET {
            return ApiError::not_found(format!("{} not found", request.uri().path()))
                .into_response();
        }

        let (mut parts, body) = request.into_parts();
        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let uri: Uri = match format!("{}{}", self.base, path_and_query).parse() {
            Ok(uri) => uri,
            Err(e) => {
                tracing::error!(base = %self.base, error = %e, "Invalid develop server URL");
                return ApiError::new(
                    axum::http::StatusCode::BAD_GATEWAY,
                    "develop_server_unavailable",
                    "invalid develop server url",
                )
                .into_response();
            }
        };
        parts.uri = uri;
        parts.headers.remove(header::HOST);

        match self.client.request(Request::from_parts(parts, body)).await {
            Ok(response) => relay(response),
            Err(e) => {
                tracing::warn!(base = %self.base, error = %e, "Develop server request failed");
                ApiError::new(
                    axum::http::StatusCode::BAD_GATEWAY,
                    "develop_server_unavailable",
                    e.to_string(),
                )
                .into_response()
            }
        }
    }
}

fn relay(response: hyper::Response<Incoming>) -> Response {
    let (parts, body) = response.into_parts();
    Response::from_parts(parts, Body::new(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(lookup("").unwrap().path, "index.html");
        assert_eq!(lookup("app.js").unwrap().content_type, "application/javascript");
        assert!(lookup("missing.png").is_none());
    }
}
