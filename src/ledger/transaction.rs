//! Transaction building and signing.
//!
//! # Responsibilities
//! - Assemble source, sequence, memo and operations
//! - Hash transactions under a network passphrase
//! - Sign with one or more keypairs and encode the envelope

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::ledger::keypair::Keypair;
use crate::ledger::types::{LedgerError, LedgerResult, Memo, Operation};

/// Base fee charged per operation, in stroops.
pub const BASE_FEE: u32 = 100;

/// An unsigned transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub source_account: String,
    pub fee: u32,
    pub sequence: u64,
    pub memo: Memo,
    pub operations: Vec<Operation>,
}

/// A signature plus the hint identifying its signer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoratedSignature {
    pub hint: String,
    pub signature: String,
}

/// A signed transaction ready for submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionEnvelope {
    pub tx: Transaction,
    pub signatures: Vec<DecoratedSignature>,
}

/// Builder for [`Transaction`].
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    source_account: String,
    sequence: u64,
    memo: Memo,
    operations: Vec<Operation>,
}

impl TransactionBuilder {
    /// Start a transaction for `source_account` using `sequence`
    /// (the account's current sequence plus one).
    pub fn new(source_account: impl Into<String>, sequence: u64) -> Self {
        Self {
            source_account: source_account.into(),
            sequence,
            memo: Memo::None,
            operations: Vec::new(),
        }
    }

    pub fn memo(mut self, memo: Memo) -> Self {
        self.memo = memo;
        self
    }

    pub fn operation(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self
    }

    pub fn operations(mut self, operations: impl IntoIterator<Item = Operation>) -> Self {
        self.operations.extend(operations);
        self
    }

    pub fn build(self) -> LedgerResult<Transaction> {
        if self.operations.is_empty() {
            return Err(LedgerError::invalid("operations", "at least one is required"));
        }
        if !crate::ledger::keypair::is_valid_account_id(&self.source_account) {
            return Err(LedgerError::InvalidAccountId(self.source_account));
        }
        let fee = BASE_FEE.saturating_mul(self.operations.len() as u32);
        Ok(Transaction {
            source_account: self.source_account,
            fee,
            sequence: self.sequence,
            memo: self.memo,
            operations: self.operations,
        })
    }
}

impl Transaction {
    /// Hash of the transaction bound to a network.
    pub fn hash(&self, network_passphrase: &str) -> LedgerResult<[u8; 32]> {
        let body = serde_json::to_vec(self).map_err(|e| LedgerError::Decode(e.to_string()))?;
        let network_id = Sha256::digest(network_passphrase.as_bytes());

        let mut hasher = Sha256::new();
        hasher.update(network_id);
        hasher.update(b"TX");
        hasher.update(&body);
        Ok(hasher.finalize().into())
    }

    /// Sign with every keypair in `signers`.
    pub fn sign(
        self,
        network_passphrase: &str,
        signers: &[&Keypair],
    ) -> LedgerResult<TransactionEnvelope> {
        let hash = self.hash(network_passphrase)?;
        let signatures = signers
            .iter()
            .map(|keypair| DecoratedSignature {
                hint: STANDARD.encode(keypair.hint()),
                signature: STANDARD.encode(keypair.sign(&hash).to_bytes()),
            })
            .collect();
        Ok(TransactionEnvelope {
            tx: self,
            signatures,
        })
    }
}

impl TransactionEnvelope {
    /// Base64 form submitted to Horizon.
    pub fn encode(&self) -> LedgerResult<String> {
        let bytes = serde_json::to_vec(self).map_err(|e| LedgerError::Decode(e.to_string()))?;
        Ok(STANDARD.encode(bytes))
    }

    pub fn decode(encoded: &str) -> LedgerResult<Self> {
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| LedgerError::Decode(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| LedgerError::Decode(e.to_string()))
    }
}
