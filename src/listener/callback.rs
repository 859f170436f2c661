//! Receive callback delivery.
//!
//! Each accepted payment is POSTed as a urlencoded form. When a MAC key is
//! configured the body is signed with HMAC-SHA256 and the base64 digest is
//! sent in `X-Payload-Mac`.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use url::Url;

use crate::ledger::{Keypair, PaymentRecord};
use crate::listener::ListenerError;
use crate::observability::metrics;

type HmacSha256 = Hmac<Sha256>;

pub const PAYLOAD_MAC_HEADER: &str = "X-Payload-Mac";

const CALLBACK_TIMEOUT: Duration = Duration::from_secs(10);

/// Posts payment notifications to the receive callback.
#[derive(Clone)]
pub struct CallbackClient {
    url: Url,
    mac_key: Option<[u8; 32]>,
    http: reqwest::Client,
}

impl CallbackClient {
    /// `mac_key` is a secret seed; empty disables signing.
    pub fn new(url: &str, mac_key: &str) -> Result<Self, ListenerError> {
        let url = Url::parse(url)
            .map_err(|e| ListenerError::Config(format!("callbacks.receive '{}': {}", url, e)))?;
        let mac_key = if mac_key.is_empty() {
            None
        } else {
            let keypair = Keypair::from_seed(mac_key)
                .map_err(|_| ListenerError::Config("mac_key is not a valid seed".to_string()))?;
            Some(keypair.secret_bytes())
        };
        let http = reqwest::Client::builder()
            .timeout(CALLBACK_TIMEOUT)
            .build()
            .map_err(|e| ListenerError::CallbackTransport(e.to_string()))?;
        Ok(Self { url, mac_key, http })
    }

    /// Form body sent for `payment`.
    pub fn encode(payment: &PaymentRecord) -> String {
        let (memo_type, memo) = payment
            .transaction
            .as_ref()
            .map(|tx| (tx.memo_type.as_str(), tx.memo.as_str()))
            .unwrap_or(("", ""));

        url::form_urlencoded::Serializer::new(String::new())
            .append_pair("id", &payment.id)
            .append_pair("from", &payment.from)
            .append_pair("route", memo)
            .append_pair("amount", &payment.amount)
            .append_pair("asset_code", payment.asset_code())
            .append_pair("asset_issuer", &payment.asset_issuer)
            .append_pair("memo_type", memo_type)
            .append_pair("memo", memo)
            .finish()
    }

    /// Base64 HMAC-SHA256 of `body`, if a MAC key is configured.
    pub fn sign(&self, body: &str) -> Option<String> {
        let key = self.mac_key?;
        let mut mac = HmacSha256::new_from_slice(&key).ok()?;
        mac.update(body.as_bytes());
        Some(STANDARD.encode(mac.finalize().into_bytes()))
    }

    /// Deliver `payment`. Anything but 200 is a failure.
    pub async fn send(&self, payment: &PaymentRecord) -> Result<(), ListenerError> {
        let body = Self::encode(payment);
        let mut request = self
            .http
            .post(self.url.clone())
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(body.clone());
        if let Some(mac) = self.sign(&body) {
            request = request.header(PAYLOAD_MAC_HEADER, mac);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                metrics::record_callback("error".to_string());
                return Err(ListenerError::CallbackTransport(e.to_string()));
            }
        };

        let status = response.status();
        metrics::record_callback(status.as_u16().to_string());
        if status != reqwest::StatusCode::OK {
            return Err(ListenerError::CallbackStatus(status.as_u16()));
        }
        Ok(())
    }
}
