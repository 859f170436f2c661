//! Stellar bridge server library.

pub mod clock;
pub mod config;
pub mod db;
pub mod discovery;
pub mod http;
pub mod ledger;
pub mod lifecycle;
pub mod listener;
pub mod observability;
pub mod resilience;
pub mod submitter;

pub use config::BridgeConfig;
pub use http::App;
pub use lifecycle::{Bootstrap, Launch, RunMode, StartupError};
