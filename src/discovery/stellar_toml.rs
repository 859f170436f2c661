//! `stellar.toml` retrieval.

use serde::Deserialize;

use crate::discovery::DiscoveryError;

/// The subset of `stellar.toml` the bridge reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StellarToml {
    #[serde(rename = "FEDERATION_SERVER", default)]
    pub federation_server: Option<String>,

    #[serde(rename = "AUTH_SERVER", default)]
    pub auth_server: Option<String>,

    #[serde(rename = "SIGNING_KEY", default)]
    pub signing_key: Option<String>,
}

#[derive(Clone)]
pub struct StellarTomlClient {
    http: reqwest::Client,
    scheme: &'static str,
}

impl StellarTomlClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            scheme: "https",
        }
    }

    /// Fetch over plain HTTP. Only for local servers in tests.
    pub fn insecure(http: reqwest::Client) -> Self {
        Self {
            http,
            scheme: "http",
        }
    }

    pub fn url_for(&self, domain: &str) -> String {
        format!("{}://{}/.well-known/stellar.toml", self.scheme, domain)
    }

    pub async fn get(&self, domain: &str) -> Result<StellarToml, DiscoveryError> {
        let url = self.url_for(domain);
        let http_error = |e: reqwest::Error| DiscoveryError::Http {
            url: url.clone(),
            reason: e.to_string(),
        };

        let response = self.http.get(&url).send().await.map_err(http_error)?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(DiscoveryError::NotFound(url));
        }
        let body = response
            .error_for_status()
            .map_err(http_error)?
            .text()
            .await
            .map_err(http_error)?;

        toml::from_str(&body).map_err(|e| DiscoveryError::Decode {
            url,
            reason: e.to_string(),
        })
    }
}
