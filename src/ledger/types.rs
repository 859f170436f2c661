//! Ledger value types and error definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// HTTP connection or request failed.
    #[error("Horizon request failed: {0}")]
    Http(String),

    /// The requested account or operation does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Horizon rejected a transaction.
    #[error("Transaction rejected ({status}): {detail}")]
    Rejected { status: u16, detail: String },

    /// Secret seed failed to decode.
    #[error("Invalid secret seed")]
    InvalidSeed,

    /// Account id failed to decode.
    #[error("Invalid account id: {0}")]
    InvalidAccountId(String),

    /// Malformed amount, memo or asset.
    #[error("Invalid {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    /// Response or envelope could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl LedgerError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

impl From<reqwest::Error> for LedgerError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.to_string())
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// An asset on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "asset_type", rename_all = "snake_case")]
pub enum Asset {
    Native,
    Credit { code: String, issuer: String },
}

impl Asset {
    /// Build from request fields: an empty code, or `XLM` without issuer,
    /// is the native asset.
    pub fn from_parts(code: &str, issuer: &str) -> LedgerResult<Self> {
        if code.is_empty() || (code == "XLM" && issuer.is_empty()) {
            return Ok(Self::Native);
        }
        if code.len() > 12 || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(LedgerError::invalid("asset_code", code));
        }
        if !crate::ledger::keypair::is_valid_account_id(issuer) {
            return Err(LedgerError::invalid("asset_issuer", issuer));
        }
        Ok(Self::Credit {
            code: code.to_string(),
            issuer: issuer.to_string(),
        })
    }
}

/// Transaction memo.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "memo_type", content = "memo", rename_all = "snake_case")]
pub enum Memo {
    #[default]
    None,
    Text(String),
    Id(u64),
    Hash(String),
}

impl Memo {
    /// Build from the `memo_type`/`memo` request pair.
    pub fn from_parts(memo_type: &str, memo: &str) -> LedgerResult<Self> {
        match memo_type {
            "" | "none" => Ok(Self::None),
            "text" if memo.len() <= 28 => Ok(Self::Text(memo.to_string())),
            "text" => Err(LedgerError::invalid("memo", "text memo longer than 28 bytes")),
            "id" => memo
                .parse()
                .map(Self::Id)
                .map_err(|_| LedgerError::invalid("memo", "id memo must be a u64")),
            "hash" if memo.len() == 64 && memo.chars().all(|c| c.is_ascii_hexdigit()) => {
                Ok(Self::Hash(memo.to_ascii_lowercase()))
            }
            "hash" => Err(LedgerError::invalid("memo", "hash memo must be 32 hex bytes")),
            other => Err(LedgerError::invalid("memo_type", other)),
        }
    }
}

/// A ledger operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    Payment {
        destination: String,
        asset: Asset,
        amount: String,
    },
    CreateAccount {
        destination: String,
        starting_balance: String,
    },
    AllowTrust {
        trustor: String,
        asset_code: String,
        authorize: bool,
    },
}

/// Check a decimal amount: positive, at most 7 fractional digits.
pub fn validate_amount(amount: &str) -> LedgerResult<()> {
    let (whole, fraction) = amount.split_once('.').unwrap_or((amount, ""));
    let digits_ok = !whole.is_empty()
        && whole.chars().all(|c| c.is_ascii_digit())
        && fraction.len() <= 7
        && fraction.chars().all(|c| c.is_ascii_digit());
    if !digits_ok {
        return Err(LedgerError::invalid("amount", amount));
    }
    if amount.chars().all(|c| c == '0' || c == '.') {
        return Err(LedgerError::invalid("amount", "must be positive"));
    }
    Ok(())
}

/// Account as returned by `GET /accounts/{id}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountResponse {
    pub account_id: String,
    /// Current sequence number (Horizon encodes it as a string).
    pub sequence: String,
}

/// Successful transaction submission.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubmitResponse {
    pub hash: String,
    #[serde(default)]
    pub ledger: Option<u64>,
    #[serde(default)]
    pub result_xdr: Option<String>,
}

/// Transaction fields joined onto an operation record.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EmbeddedTransaction {
    #[serde(default)]
    pub memo_type: String,
    #[serde(default)]
    pub memo: String,
}

/// A payment-like operation as returned by Horizon.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PaymentRecord {
    pub id: String,
    pub paging_token: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub asset_type: String,
    #[serde(default)]
    pub asset_code: String,
    #[serde(default)]
    pub asset_issuer: String,
    #[serde(default)]
    pub transaction_hash: String,
    #[serde(default)]
    pub transaction: Option<EmbeddedTransaction>,
}

impl PaymentRecord {
    /// Asset code with `XLM` standing in for the native asset.
    pub fn asset_code(&self) -> &str {
        if self.asset_type == "native" {
            "XLM"
        } else {
            &self.asset_code
        }
    }
}
