//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! startup steps, submitter, listener, callbacks
//!     → logging.rs (structured log events, pretty or JSON)
//!     → metrics.rs (counters exposed on a Prometheus endpoint)
//!
//! HTTP requests
//!     → TraceLayer spans carrying x-request-id
//! ```
//!
//! # Design Decisions
//! - Log level comes from RUST_LOG, defaulting to info for the bridge
//! - Metrics are optional; counters are no-ops without an installed recorder

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LogFormat};
