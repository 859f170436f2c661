//! In-process ledger double for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::ledger::client::LedgerClient;
use crate::ledger::types::{
    AccountResponse, LedgerError, LedgerResult, PaymentRecord, SubmitResponse,
};

#[derive(Default)]
pub struct MockLedger {
    accounts: Mutex<HashMap<String, u64>>,
    payments: Mutex<Vec<PaymentRecord>>,
    submitted: Mutex<Vec<String>>,
    reject: AtomicBool,
}

impl MockLedger {
    pub fn with_account(self, account_id: &str, sequence: u64) -> Self {
        self.accounts
            .lock()
            .unwrap()
            .insert(account_id.to_string(), sequence);
        self
    }

    pub fn push_payment(&self, payment: PaymentRecord) {
        self.payments.lock().unwrap().push(payment);
    }

    pub fn submitted(&self) -> Vec<String> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn reject_submissions(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }
}

fn token(cursor: &str) -> u64 {
    cursor.parse().unwrap_or(0)
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn load_account(&self, account_id: &str) -> LedgerResult<AccountResponse> {
        let accounts = self.accounts.lock().unwrap();
        let sequence = accounts
            .get(account_id)
            .ok_or_else(|| LedgerError::NotFound(format!("account {}", account_id)))?;
        Ok(AccountResponse {
            account_id: account_id.to_string(),
            sequence: sequence.to_string(),
        })
    }

    async fn submit_transaction(&self, envelope: &str) -> LedgerResult<SubmitResponse> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(LedgerError::Rejected {
                status: 400,
                detail: "tx_bad_seq".into(),
            });
        }
        let mut submitted = self.submitted.lock().unwrap();
        submitted.push(envelope.to_string());
        Ok(SubmitResponse {
            hash: format!("hash-{}", submitted.len()),
            ledger: Some(submitted.len() as u64),
            result_xdr: None,
        })
    }

    async fn load_payments(
        &self,
        _account_id: &str,
        cursor: &str,
        limit: u32,
    ) -> LedgerResult<Vec<PaymentRecord>> {
        let after = token(cursor);
        Ok(self
            .payments
            .lock()
            .unwrap()
            .iter()
            .filter(|p| token(&p.paging_token) > after)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn load_operation(&self, operation_id: &str) -> LedgerResult<PaymentRecord> {
        self.payments
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == operation_id)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("operation {}", operation_id)))
    }

    async fn latest_cursor(&self, _account_id: &str) -> LedgerResult<Option<String>> {
        Ok(self
            .payments
            .lock()
            .unwrap()
            .last()
            .map(|p| p.paging_token.clone()))
    }
}
