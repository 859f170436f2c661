//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the bridge.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the bridge server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Port the HTTP server binds on all interfaces.
    pub port: u16,

    /// Base URL of the ledger (Horizon) API.
    pub horizon: String,

    /// Network passphrase mixed into every transaction hash.
    pub network_passphrase: String,

    /// Shared secret expected in `X-API-Key`. Empty disables the check.
    pub api_key: String,

    /// Secret seed used to sign callback payloads. Empty disables signing.
    pub mac_key: String,

    /// Serve the admin GUI from `develop_server` instead of the embedded bundle.
    pub develop: bool,

    /// Development GUI server proxied to in develop mode.
    pub develop_server: String,

    /// Persistence settings.
    pub database: DatabaseConfig,

    /// Signing and receiving accounts.
    pub accounts: AccountsConfig,

    /// Callback endpoints.
    pub callbacks: CallbacksConfig,

    /// Assets the payment listener accepts.
    pub assets: Vec<AssetConfig>,

    /// Payment listener tuning.
    pub listener: ListenerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            port: 8001,
            horizon: "https://horizon-testnet.stellar.org".to_string(),
            network_passphrase: "Test SDF Network ; September 2015".to_string(),
            api_key: String::new(),
            mac_key: String::new(),
            develop: false,
            develop_server: "http://localhost:3000".to_string(),
            database: DatabaseConfig::default(),
            accounts: AccountsConfig::default(),
            callbacks: CallbacksConfig::default(),
            assets: Vec::new(),
            listener: ListenerConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `mysql`, `postgres`, or empty to run without persistence.
    #[serde(rename = "type")]
    pub kind: String,

    /// Connection URL handed to the driver.
    pub url: String,
}

/// Account configuration. Empty values disable the related feature.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AccountsConfig {
    /// Seed of the account allowed to authorize trustlines.
    pub authorizing_seed: String,

    /// Seed of the default source account for payments.
    pub base_seed: String,

    /// Account watched for incoming payments.
    pub receiving_account_id: String,
}

/// Callback configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CallbacksConfig {
    /// URL notified for each incoming payment.
    pub receive: String,
}

/// An asset accepted by the payment listener.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AssetConfig {
    /// Asset code (`XLM` for the native asset).
    pub code: String,

    /// Issuing account; empty for the native asset.
    #[serde(default)]
    pub issuer: String,
}

/// Payment listener tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Delay between polls of the ledger in seconds.
    pub poll_interval_secs: u64,

    /// Maximum payments fetched per poll.
    pub page_limit: u32,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
            page_limit: 200,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

impl BridgeConfig {
    /// Whether `asset_code`/`asset_issuer` is in the accepted asset list.
    ///
    /// `XLM` with an empty issuer denotes the native asset.
    pub fn accepts_asset(&self, asset_code: &str, asset_issuer: &str) -> bool {
        self.assets
            .iter()
            .any(|asset| asset.code == asset_code && asset.issuer == asset_issuer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: BridgeConfig = toml::from_str("port = 9000").unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.listener.poll_interval_secs, 5);
        assert_eq!(config.develop_server, "http://localhost:3000");
        assert!(config.database.kind.is_empty());
        assert!(!config.develop);
    }

    #[test]
    fn test_database_type_key() {
        let config: BridgeConfig = toml::from_str(
            r#"
            [database]
            type = "postgres"
            url = "postgres://localhost/bridge"
            "#,
        )
        .unwrap();
        assert_eq!(config.database.kind, "postgres");
        assert_eq!(config.database.url, "postgres://localhost/bridge");
    }

    #[test]
    fn test_accepts_asset() {
        let config: BridgeConfig = toml::from_str(
            r#"
            [[assets]]
            code = "USD"
            issuer = "GISSUER"

            [[assets]]
            code = "XLM"
            "#,
        )
        .unwrap();
        assert!(config.accepts_asset("USD", "GISSUER"));
        assert!(config.accepts_asset("XLM", ""));
        assert!(!config.accepts_asset("USD", "GOTHER"));
        assert!(!config.accepts_asset("EUR", "GISSUER"));
    }
}
