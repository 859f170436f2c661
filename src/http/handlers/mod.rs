//! Request handlers.
//!
//! Handlers only see the [`Services`] aggregate; how its collaborators were
//! built is the startup sequence's business.

pub mod admin;
pub mod reprocess;
pub mod transactions;

use std::sync::Arc;

use crate::db::Repository;
use crate::http::response::ApiError;
use crate::lifecycle::Services;
use crate::listener::PaymentListener;

/// Shared state behind every route.
pub struct RequestHandler {
    services: Services,
}

impl RequestHandler {
    pub fn new(services: Services) -> Self {
        Self { services }
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    fn repository(&self) -> Result<&Repository, ApiError> {
        self.services.repository.as_ref().ok_or_else(|| {
            ApiError::unavailable("persistence_disabled", "no database is configured")
        })
    }

    fn listener(&self) -> Result<&Arc<PaymentListener>, ApiError> {
        self.services.listener.as_ref().ok_or_else(|| {
            ApiError::unavailable("listener_disabled", "payment listener is not running")
        })
    }
}
