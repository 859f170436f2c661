//! Payment listener subsystem.
//!
//! # Data Flow
//! ```text
//! listen()
//!     → verify receiving account on the ledger
//!     → resume cursor (repository last cursor, else ledger head)
//!     → spawn poll loop
//!
//! poll loop:
//!     load_payments(cursor) → process(payment) → persist status → advance cursor
//!     callback_error → persist status → advance cursor (retry via reprocess)
//!     ledger or persistence error → backoff (resilience::backoff) → retry same cursor
//!     shutdown flag → exit
//!
//! process(payment):
//!     not a payment | outgoing | asset not allowed → status only
//!     otherwise → callback.rs (signed form POST) → success | callback_error
//! ```

pub mod callback;
pub mod payment_listener;

use thiserror::Error;

use crate::db::DbError;
use crate::ledger::LedgerError;

pub use callback::CallbackClient;
pub use payment_listener::PaymentListener;

/// Outcome recorded for every processed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Success,
    NotPaymentOperation,
    OutgoingPayment,
    AssetNotAllowed,
    CallbackError,
    AlreadyProcessed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NotPaymentOperation => "not_payment_operation",
            Self::OutgoingPayment => "outgoing_payment",
            Self::AssetNotAllowed => "asset_not_allowed",
            Self::CallbackError => "callback_error",
            Self::AlreadyProcessed => "already_processed",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while constructing, starting or running the listener.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("invalid listener configuration: {0}")]
    Config(String),

    #[error("receiving account {account} unavailable: {source}")]
    ReceivingAccount {
        account: String,
        #[source]
        source: LedgerError,
    },

    #[error("payment listener is already running")]
    AlreadyListening,

    #[error("operation {0} was already processed")]
    AlreadyProcessed(String),

    #[error("receive callback returned status {0}")]
    CallbackStatus(u16),

    #[error("receive callback failed: {0}")]
    CallbackTransport(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Persistence(#[from] DbError),
}
