//! JSON error responses.
//!
//! Every failed request answers `{ "code": ..., "message": ... }` with a
//! status derived from the subsystem error that caused it.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::db::DbError;
use crate::discovery::DiscoveryError;
use crate::ledger::LedgerError;
use crate::listener::ListenerError;
use crate::submitter::SubmitterError;

/// An error rendered as a JSON body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    pub fn unavailable(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, code, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "forbidden", message)
    }

    fn internal(error: &dyn std::fmt::Display) -> Self {
        tracing::error!(error = %error, "Request failed");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "internal server error",
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.code,
            message: &self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InvalidSeed => Self::bad_request("invalid_seed", e.to_string()),
            LedgerError::InvalidAccountId(_) | LedgerError::InvalidValue { .. } => {
                Self::bad_request("invalid_parameter", e.to_string())
            }
            LedgerError::NotFound(_) => Self::not_found(e.to_string()),
            LedgerError::Rejected { .. } => Self::bad_request("transaction_failed", e.to_string()),
            LedgerError::Http(_) | LedgerError::Decode(_) => {
                Self::new(StatusCode::BAD_GATEWAY, "ledger_unavailable", e.to_string())
            }
        }
    }
}

impl From<SubmitterError> for ApiError {
    fn from(e: SubmitterError) -> Self {
        match e {
            SubmitterError::Seed(_) => Self::bad_request("invalid_seed", e.to_string()),
            SubmitterError::Account {
                source: LedgerError::NotFound(_),
                ..
            } => Self::bad_request("source_not_exist", e.to_string()),
            SubmitterError::Account { source, .. } => source.into(),
            SubmitterError::Ledger(source) => source.into(),
            SubmitterError::Sequence { .. } | SubmitterError::Persistence(_) => Self::internal(&e),
        }
    }
}

impl From<ListenerError> for ApiError {
    fn from(e: ListenerError) -> Self {
        match e {
            ListenerError::AlreadyProcessed(_) => {
                Self::bad_request("already_processed", e.to_string())
            }
            ListenerError::CallbackStatus(_) | ListenerError::CallbackTransport(_) => {
                Self::new(StatusCode::BAD_GATEWAY, "callback_error", e.to_string())
            }
            ListenerError::Ledger(source) => source.into(),
            _ => Self::internal(&e),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        Self::internal(&e)
    }
}

impl From<DiscoveryError> for ApiError {
    fn from(e: DiscoveryError) -> Self {
        match e {
            DiscoveryError::InvalidAddress(_) => {
                Self::bad_request("invalid_destination", e.to_string())
            }
            DiscoveryError::NotFound(_) | DiscoveryError::NoFederationServer { .. } => {
                Self::bad_request("cannot_resolve_destination", e.to_string())
            }
            DiscoveryError::Http { .. } | DiscoveryError::Decode { .. } => {
                Self::new(StatusCode::BAD_GATEWAY, "federation_unavailable", e.to_string())
            }
        }
    }
}
