//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → BridgeConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Empty strings mean "feature disabled", never "invalid"
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AccountsConfig, AssetConfig, BridgeConfig, CallbacksConfig, DatabaseConfig, ListenerConfig,
    ObservabilityConfig,
};
pub use validation::{check_api_key, validate_config, ValidationError, MIN_API_KEY_LEN};
