//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum::serve, graceful shutdown)
//!     → middleware/trailing_slash.rs (before routing)
//!     → request id, tracing, response headers
//!     → middleware/api_key.rs (when api_key is set)
//!     → handlers/ (transactions, reprocess, admin) or gui.rs
//!     → response.rs (JSON errors)
//! ```

pub mod gui;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod server;

pub use handlers::RequestHandler;
pub use response::ApiError;
pub use server::{compose_routes, App, AppService};
