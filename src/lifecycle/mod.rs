//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     RunMode → Version: print banner, exit
//!             → Migrate: select driver → connect → migrate_up("gateway") → exit
//!             → Serve:   ordered init steps → graph.rs (typed slots) → App
//!
//! Shutdown (shutdown.rs):
//!     sticky stop flag watched by background tasks (payment listener)
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → graceful HTTP drain → shutdown broadcast
//! ```
//!
//! # Design Decisions
//! - Steps run strictly in order; the first fatal error aborts startup
//! - Missing optional features are skipped with a warning, never an error
//! - Terminal modes are resolved before anything touches the network

pub mod graph;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use graph::{DependencyError, GraphBuilder, Services};
pub use shutdown::{Shutdown, ShutdownSignal};
pub use startup::{run, version_banner, Bootstrap, Exit, Launch, RunMode, StartupError};
