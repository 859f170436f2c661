//! Horizon API client.
//!
//! # Responsibilities
//! - Load accounts (existence, sequence numbers)
//! - Submit signed transaction envelopes
//! - Page through payments received by an account
//! - Load single operations for reprocessing

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

use crate::ledger::types::{
    AccountResponse, LedgerError, LedgerResult, PaymentRecord, SubmitResponse,
};

/// Ledger operations the bridge depends on.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn load_account(&self, account_id: &str) -> LedgerResult<AccountResponse>;

    /// Submit a base64 envelope.
    async fn submit_transaction(&self, envelope: &str) -> LedgerResult<SubmitResponse>;

    /// Payments involving `account_id` after `cursor`, oldest first.
    async fn load_payments(
        &self,
        account_id: &str,
        cursor: &str,
        limit: u32,
    ) -> LedgerResult<Vec<PaymentRecord>>;

    async fn load_operation(&self, operation_id: &str) -> LedgerResult<PaymentRecord>;

    /// Paging token of the newest payment involving `account_id`, if any.
    async fn latest_cursor(&self, account_id: &str) -> LedgerResult<Option<String>>;
}

#[derive(Deserialize)]
struct Page<T> {
    #[serde(rename = "_embedded")]
    embedded: Records<T>,
}

#[derive(Deserialize)]
struct Records<T> {
    records: Vec<T>,
}

#[derive(Deserialize, Default)]
struct Problem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    detail: String,
}

/// Horizon HTTP client.
#[derive(Clone)]
pub struct HorizonClient {
    base_url: Url,
    http: reqwest::Client,
}

impl HorizonClient {
    /// Create a client for `base_url` with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> LedgerResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| LedgerError::Http(format!("Invalid Horizon URL '{}': {}", base_url, e)))?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> LedgerResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| LedgerError::Http(format!("Invalid path '{}': {}", path, e)))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: Url,
        what: &str,
    ) -> LedgerResult<T> {
        let response = self.http.get(url).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(LedgerError::NotFound(what.to_string())),
            status if status.is_success() => response
                .json()
                .await
                .map_err(|e| LedgerError::Decode(e.to_string())),
            status => Err(LedgerError::Http(format!("{} returned {}", what, status))),
        }
    }
}

#[async_trait]
impl LedgerClient for HorizonClient {
    async fn load_account(&self, account_id: &str) -> LedgerResult<AccountResponse> {
        let url = self.endpoint(&format!("accounts/{}", account_id))?;
        self.get_json(url, &format!("account {}", account_id)).await
    }

    async fn submit_transaction(&self, envelope: &str) -> LedgerResult<SubmitResponse> {
        let url = self.endpoint("transactions")?;
        let response = self.http.post(url).form(&[("tx", envelope)]).send().await?;
        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| LedgerError::Decode(e.to_string()));
        }

        let problem: Problem = response.json().await.unwrap_or_default();
        tracing::warn!(status = %status, title = %problem.title, "Transaction rejected by Horizon");
        Err(LedgerError::Rejected {
            status: status.as_u16(),
            detail: if problem.detail.is_empty() {
                problem.title
            } else {
                problem.detail
            },
        })
    }

    async fn load_payments(
        &self,
        account_id: &str,
        cursor: &str,
        limit: u32,
    ) -> LedgerResult<Vec<PaymentRecord>> {
        let mut url = self.endpoint(&format!("accounts/{}/payments", account_id))?;
        if !cursor.is_empty() {
            url.query_pairs_mut().append_pair("cursor", cursor);
        }
        url.query_pairs_mut()
            .append_pair("order", "asc")
            .append_pair("limit", &limit.to_string())
            .append_pair("join", "transactions");
        let page: Page<PaymentRecord> = self
            .get_json(url, &format!("payments of {}", account_id))
            .await?;
        Ok(page.embedded.records)
    }

    async fn load_operation(&self, operation_id: &str) -> LedgerResult<PaymentRecord> {
        let mut url = self.endpoint(&format!("operations/{}", operation_id))?;
        url.query_pairs_mut().append_pair("join", "transactions");
        self.get_json(url, &format!("operation {}", operation_id))
            .await
    }

    async fn latest_cursor(&self, account_id: &str) -> LedgerResult<Option<String>> {
        let mut url = self.endpoint(&format!("accounts/{}/payments", account_id))?;
        url.query_pairs_mut()
            .append_pair("order", "desc")
            .append_pair("limit", "1");
        let page: Page<PaymentRecord> = self
            .get_json(url, &format!("payments of {}", account_id))
            .await?;
        Ok(page.embedded.records.into_iter().next().map(|p| p.paging_token))
    }
}

impl std::fmt::Debug for HorizonClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HorizonClient")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Path, routing::get, Json, Router};

    async fn spawn_horizon() -> String {
        let app = Router::new()
            .route(
                "/accounts/{id}",
                get(|Path(id): Path<String>| async move {
                    if id == "GMISSING" {
                        Err(StatusCode::NOT_FOUND)
                    } else {
                        Ok(Json(serde_json::json!({ "account_id": id, "sequence": "41" })))
                    }
                }),
            )
            .route(
                "/accounts/{id}/payments",
                get(|| async {
                    Json(serde_json::json!({
                        "_embedded": { "records": [
                            { "id": "1", "paging_token": "1", "type": "payment" },
                            { "id": "2", "paging_token": "2", "type": "create_account" }
                        ]}
                    }))
                }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/", addr)
    }

    #[test]
    fn test_invalid_base_url() {
        let result = HorizonClient::new("not a url", Duration::from_secs(1));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_load_account_and_payments() {
        let base = spawn_horizon().await;
        let client = HorizonClient::new(&base, Duration::from_secs(5)).unwrap();

        let account = client.load_account("GEXISTS").await.unwrap();
        assert_eq!(account.sequence, "41");

        let missing = client.load_account("GMISSING").await;
        assert!(matches!(missing, Err(LedgerError::NotFound(_))));

        let payments = client.load_payments("GEXISTS", "now", 10).await.unwrap();
        assert_eq!(payments.len(), 2);
        assert_eq!(payments[1].kind, "create_account");

        let latest = client.latest_cursor("GEXISTS").await.unwrap();
        assert_eq!(latest.as_deref(), Some("1"));
    }
}
