//! Transaction submission subsystem.
//!
//! # Data Flow
//! ```text
//! startup: init_account(seed) → load sequence from Horizon → register
//! request: submit(seed, operations, memo)
//!     → next sequence (under lock)
//!     → build + sign envelope
//!     → sent_transaction row (sending)
//!     → Horizon submit
//!     → sent_transaction row (success | failure)
//! ```

pub mod transaction_submitter;

use thiserror::Error;

use crate::db::DbError;
use crate::ledger::LedgerError;

pub use transaction_submitter::TransactionSubmitter;

/// Errors raised while configuring accounts or submitting transactions.
#[derive(Debug, Error)]
pub enum SubmitterError {
    #[error("invalid seed: {0}")]
    Seed(LedgerError),

    #[error("cannot load account {account}: {source}")]
    Account {
        account: String,
        #[source]
        source: LedgerError,
    },

    #[error("account {account} has malformed sequence '{sequence}'")]
    Sequence { account: String, sequence: String },

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Persistence(#[from] DbError),
}
