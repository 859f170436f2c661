//! Persistence subsystem.
//!
//! # Data Flow
//! ```text
//! database.type (config)
//!     → DriverKind::select (mysql | postgres | none)
//!     → Driver::connect(url)
//!     → EntityManager (writes) + Repository (reads), sharing the driver
//! ```
//!
//! # Design Decisions
//! - "none" is a legitimate mode: the bridge serves a reduced surface
//! - Drivers are behind a trait so startup can be exercised without a server
//! - The handle is connected once during startup and read concurrently after

pub mod driver;
pub mod entity;
pub mod entity_manager;
pub mod migrations;
pub mod repository;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use thiserror::Error;

use crate::config::ConfigError;

pub use driver::SqlDriver;
pub use entity_manager::{
    EntityManager, NewReceivedPayment, NewSentTransaction, SentTransactionOutcome,
};
pub use repository::{Pagination, Repository};

/// Errors raised by drivers and the persistence facades.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("database driver is not connected")]
    NotConnected,

    #[error("database driver is already connected")]
    AlreadyConnected,

    #[error("invalid database url: {0}")]
    InvalidUrl(String),

    #[error("{driver} driver cannot open '{scheme}' urls")]
    SchemeMismatch { driver: &'static str, scheme: String },

    #[error("unknown migration set: {0}")]
    UnknownMigrationSet(String),

    #[error("database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for DbError {
    fn from(e: sea_orm::DbErr) -> Self {
        Self::Database(e.to_string())
    }
}

/// Result type for persistence operations.
pub type DbResult<T> = Result<T, DbError>;

/// A persistence backend.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &'static str;

    /// Open the connection pool. Called once during startup.
    async fn connect(&self, url: &str) -> DbResult<()>;

    /// Apply pending migrations of `migration_set`, returning how many ran.
    async fn migrate_up(&self, migration_set: &str) -> DbResult<usize>;

    /// The open connection, or [`DbError::NotConnected`].
    fn connection(&self) -> DbResult<&DatabaseConnection>;
}

/// Backends selectable from `database.type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverKind {
    MySql,
    Postgres,
}

impl DriverKind {
    /// Map `database.type` to a backend. Empty selects no persistence.
    pub fn select(kind: &str) -> Result<Option<Self>, ConfigError> {
        match kind {
            "mysql" => Ok(Some(Self::MySql)),
            "postgres" => Ok(Some(Self::Postgres)),
            "" => Ok(None),
            other => Err(ConfigError::UnsupportedDatabase(other.to_string())),
        }
    }

    /// Instantiate an unconnected driver.
    pub fn driver(self) -> Arc<dyn Driver> {
        match self {
            Self::MySql => Arc::new(SqlDriver::mysql()),
            Self::Postgres => Arc::new(SqlDriver::postgres()),
        }
    }
}
