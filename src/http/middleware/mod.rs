//! Request middleware.
//!
//! - `trailing_slash`: strips a trailing `/` before routing
//! - `api_key`: enforces `X-API-Key` when a key is configured

pub mod api_key;
pub mod trailing_slash;

pub use api_key::{api_key_middleware, ApiKey, API_KEY_HEADER};
pub use trailing_slash::trim_trailing_slash;
