//! Federation address resolution.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::discovery::{DiscoveryError, StellarTomlClient};
use crate::ledger::keypair::is_valid_account_id;

/// Federation server answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct FederationRecord {
    pub account_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

#[derive(Clone)]
pub struct FederationClient {
    http: reqwest::Client,
    stellar_toml: StellarTomlClient,
}

impl FederationClient {
    pub fn new(http: reqwest::Client, stellar_toml: StellarTomlClient) -> Self {
        Self { http, stellar_toml }
    }

    /// Resolve an account id or `name*domain` address.
    pub async fn lookup(&self, address: &str) -> Result<FederationRecord, DiscoveryError> {
        if is_valid_account_id(address) {
            return Ok(FederationRecord {
                account_id: address.to_string(),
                ..Default::default()
            });
        }

        let (name, domain) = split_address(address)?;
        let server = self
            .stellar_toml
            .get(domain)
            .await?
            .federation_server
            .ok_or_else(|| DiscoveryError::NoFederationServer {
                domain: domain.to_string(),
            })?;

        let mut url = Url::parse(&server).map_err(|e| DiscoveryError::Decode {
            url: server.clone(),
            reason: e.to_string(),
        })?;
        url.query_pairs_mut()
            .append_pair("q", &format!("{}*{}", name, domain))
            .append_pair("type", "name");

        let http_error = |e: reqwest::Error| DiscoveryError::Http {
            url: url.to_string(),
            reason: e.to_string(),
        };
        let response = self.http.get(url.clone()).send().await.map_err(http_error)?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(DiscoveryError::NotFound(address.to_string()));
        }
        let record: FederationRecord = response
            .error_for_status()
            .map_err(http_error)?
            .json()
            .await
            .map_err(|e| DiscoveryError::Decode {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if !is_valid_account_id(&record.account_id) {
            return Err(DiscoveryError::Decode {
                url: url.to_string(),
                reason: format!("'{}' is not an account id", record.account_id),
            });
        }
        Ok(record)
    }
}

fn split_address(address: &str) -> Result<(&str, &str), DiscoveryError> {
    match address.rsplit_once('*') {
        Some((name, domain)) if !name.is_empty() && !domain.is_empty() => Ok((name, domain)),
        _ => Err(DiscoveryError::InvalidAddress(address.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Keypair;
    use axum::{extract::Query, routing::get, Json, Router};
    use std::collections::HashMap;

    #[test]
    fn test_split_address() {
        assert_eq!(split_address("bob*example.com").unwrap(), ("bob", "example.com"));
        assert_eq!(
            split_address("bob@mail.com*example.com").unwrap(),
            ("bob@mail.com", "example.com")
        );
        assert!(split_address("bob").is_err());
        assert!(split_address("*example.com").is_err());
        assert!(split_address("bob*").is_err());
    }

    #[tokio::test]
    async fn test_account_id_passes_through() {
        let http = reqwest::Client::new();
        let client = FederationClient::new(http.clone(), StellarTomlClient::new(http));
        let account = Keypair::random().address();
        let record = client.lookup(&account).await.unwrap();
        assert_eq!(record.account_id, account);
        assert!(record.memo.is_none());
    }

    #[tokio::test]
    async fn test_resolves_through_stellar_toml() {
        let account = Keypair::random().address();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let toml_body = format!("FEDERATION_SERVER = \"http://{}/federation\"\n", addr);
        let answer = account.clone();
        let app = Router::new()
            .route("/.well-known/stellar.toml", get(move || async move { toml_body }))
            .route(
                "/federation",
                get(move |Query(q): Query<HashMap<String, String>>| async move {
                    assert_eq!(q.get("type").map(String::as_str), Some("name"));
                    Json(FederationRecord {
                        account_id: answer,
                        memo_type: Some("id".into()),
                        memo: q.get("q").cloned(),
                    })
                }),
            );
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let http = reqwest::Client::new();
        let client = FederationClient::new(http.clone(), StellarTomlClient::insecure(http));
        let record = client.lookup(&format!("alice*{}", addr)).await.unwrap();
        assert_eq!(record.account_id, account);
        assert_eq!(record.memo, Some(format!("alice*{}", addr)));
    }
}
