//! Address discovery.
//!
//! # Data Flow
//! ```text
//! "name*example.com"
//!     → stellar_toml.rs (https://example.com/.well-known/stellar.toml)
//!     → FEDERATION_SERVER
//!     → federation.rs (?q=name*example.com&type=name)
//!     → account id (+ optional memo)
//! ```

pub mod federation;
pub mod stellar_toml;

use std::time::Duration;

use thiserror::Error;

pub use federation::{FederationClient, FederationRecord};
pub use stellar_toml::{StellarToml, StellarTomlClient};

/// Timeout shared by the discovery HTTP client.
pub const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("invalid address '{0}'")]
    InvalidAddress(String),

    #[error("{domain} has no federation server")]
    NoFederationServer { domain: String },

    #[error("{0} not found")]
    NotFound(String),

    #[error("request to {url} failed: {reason}")]
    Http { url: String, reason: String },

    #[error("malformed response from {url}: {reason}")]
    Decode { url: String, reason: String },
}

/// The shared HTTP client with [`DISCOVERY_TIMEOUT`].
pub fn http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().timeout(DISCOVERY_TIMEOUT).build()
}
