//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate URLs, account ids and seeds that are present
//! - Enforce the API key length policy at startup
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Empty values mean "feature disabled" and are never errors here
//! - Validation is pure function: BridgeConfig → Result<(), Vec<ValidationError>>

use std::fmt;
use std::net::SocketAddr;

use crate::config::loader::ConfigError;
use crate::config::schema::BridgeConfig;
use crate::ledger::keypair::{is_valid_account_id, is_valid_seed};

/// Minimum accepted length of a non-empty API key.
pub const MIN_API_KEY_LEN: usize = 15;

/// A single semantic problem with a configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &BridgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if url::Url::parse(&config.horizon).is_err() {
        errors.push(ValidationError::new("horizon", "must be a valid URL"));
    }

    if config.network_passphrase.is_empty() {
        errors.push(ValidationError::new("network_passphrase", "must not be empty"));
    }

    if !config.callbacks.receive.is_empty() && url::Url::parse(&config.callbacks.receive).is_err() {
        errors.push(ValidationError::new("callbacks.receive", "must be a valid URL"));
    }

    if config.develop && url::Url::parse(&config.develop_server).is_err() {
        errors.push(ValidationError::new("develop_server", "must be a valid URL"));
    }

    let receiving = &config.accounts.receiving_account_id;
    if !receiving.is_empty() && !is_valid_account_id(receiving) {
        errors.push(ValidationError::new(
            "accounts.receiving_account_id",
            "must be a valid account id",
        ));
    }

    if !config.mac_key.is_empty() && !is_valid_seed(&config.mac_key) {
        errors.push(ValidationError::new("mac_key", "must be a valid secret seed"));
    }

    let metrics = &config.observability;
    if metrics.metrics_enabled && metrics.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "must be a socket address",
        ));
    }

    for (i, asset) in config.assets.iter().enumerate() {
        let valid_code = !asset.code.is_empty()
            && asset.code.len() <= 12
            && asset.code.chars().all(|c| c.is_ascii_alphanumeric());
        if !valid_code {
            errors.push(ValidationError::new(
                format!("assets[{i}].code"),
                "must be 1-12 alphanumeric characters",
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// API key policy: empty disables the key, otherwise it must be at least
/// [`MIN_API_KEY_LEN`] bytes.
pub fn check_api_key(api_key: &str) -> Result<(), ConfigError> {
    let len = api_key.len();
    if len > 0 && len < MIN_API_KEY_LEN {
        return Err(ConfigError::ApiKeyTooShort {
            min: MIN_API_KEY_LEN,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::AssetConfig;
    use crate::ledger::keypair::Keypair;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&BridgeConfig::default()).is_ok());
    }

    #[test]
    fn test_api_key_policy() {
        assert!(check_api_key("").is_ok());
        for len in 1..MIN_API_KEY_LEN {
            assert!(check_api_key(&"k".repeat(len)).is_err(), "length {len}");
        }
        assert!(check_api_key(&"k".repeat(MIN_API_KEY_LEN)).is_ok());
        assert!(check_api_key(&"k".repeat(64)).is_ok());
    }

    #[test]
    fn test_api_key_length_counts_bytes() {
        // "é" is two bytes in UTF-8.
        assert!(check_api_key(&"é".repeat(8)).is_ok());
        assert!(check_api_key(&"é".repeat(7)).is_err());
    }

    #[test]
    fn test_metrics_address_checked_when_enabled() {
        let mut config = BridgeConfig::default();
        config.observability.metrics_address = "not an address".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "observability.metrics_address");

        config.observability.metrics_address = "0.0.0.0:9100".into();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_rejects_malformed_account_and_mac_key() {
        let mut config = BridgeConfig::default();
        config.accounts.receiving_account_id = "GBAD".into();
        config.mac_key = "SBAD".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["accounts.receiving_account_id", "mac_key"]);
    }

    #[test]
    fn test_accepts_well_formed_keys() {
        let keypair = Keypair::random();
        let mut config = BridgeConfig::default();
        config.accounts.receiving_account_id = keypair.address();
        config.mac_key = keypair.seed();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_asset_code_length() {
        let mut config = BridgeConfig::default();
        config.assets.push(AssetConfig {
            code: "THIRTEENCHARS".into(),
            issuer: String::new(),
        });
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "assets[0].code");
    }
}
