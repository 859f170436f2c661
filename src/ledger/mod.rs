//! Ledger integration subsystem.
//!
//! # Data Flow
//! ```text
//! Config (seeds, Horizon URL, network passphrase)
//!     → keypair.rs (seed decoding, signing)
//!     → transaction.rs (build, hash, sign, encode)
//!     → client.rs (Horizon HTTP API with timeouts)
//! ```
//!
//! # Security Constraints
//! - Seeds are never logged or serialized back out
//! - All Horizon calls have a request timeout
//! - The envelope wire format is opaque to the rest of the crate

pub mod client;
pub mod keypair;
pub mod transaction;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{HorizonClient, LedgerClient};
pub use keypair::Keypair;
pub use transaction::{Transaction, TransactionBuilder, TransactionEnvelope};
pub use types::{
    AccountResponse, Asset, LedgerError, LedgerResult, Memo, Operation, PaymentRecord,
    SubmitResponse,
};
