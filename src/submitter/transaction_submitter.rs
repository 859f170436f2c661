//! Signs and submits transactions for configured accounts.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::clock::Clock;
use crate::db::{EntityManager, NewSentTransaction, SentTransactionOutcome};
use crate::ledger::{
    Keypair, LedgerClient, LedgerError, Memo, Operation, SubmitResponse, TransactionBuilder,
};
use crate::observability::metrics;
use crate::submitter::SubmitterError;

struct Account {
    keypair: Keypair,
    sequence: u64,
}

/// Holds the signing accounts and submits transactions on their behalf.
pub struct TransactionSubmitter {
    ledger: Arc<dyn LedgerClient>,
    entity_manager: Option<EntityManager>,
    network_passphrase: String,
    clock: Clock,
    accounts: Mutex<HashMap<String, Account>>,
}

impl TransactionSubmitter {
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        entity_manager: Option<EntityManager>,
        network_passphrase: impl Into<String>,
        clock: Clock,
    ) -> Self {
        Self {
            ledger,
            entity_manager,
            network_passphrase: network_passphrase.into(),
            clock,
            accounts: Mutex::new(HashMap::new()),
        }
    }

    pub fn network_passphrase(&self) -> &str {
        &self.network_passphrase
    }

    /// Decode `seed`, load its sequence and register it. Returns the address.
    pub async fn init_account(&self, seed: &str) -> Result<String, SubmitterError> {
        let keypair = Keypair::from_seed(seed).map_err(SubmitterError::Seed)?;
        let address = keypair.address();
        let sequence = self.load_sequence(&address).await?;

        self.accounts
            .lock()
            .await
            .insert(address.clone(), Account { keypair, sequence });

        tracing::info!(account = %address, sequence, "Account initialized");
        Ok(address)
    }

    /// Whether `address` was registered by [`init_account`](Self::init_account).
    pub async fn has_account(&self, address: &str) -> bool {
        self.accounts.lock().await.contains_key(address)
    }

    async fn load_sequence(&self, address: &str) -> Result<u64, SubmitterError> {
        let account = self
            .ledger
            .load_account(address)
            .await
            .map_err(|source| SubmitterError::Account {
                account: address.to_string(),
                source,
            })?;
        account
            .sequence
            .parse()
            .map_err(|_| SubmitterError::Sequence {
                account: address.to_string(),
                sequence: account.sequence.clone(),
            })
    }

    /// Sign `operations` with `seed` and submit them.
    ///
    /// Unregistered seeds are initialized on first use. Submissions from one
    /// process are serialized so sequence numbers never collide.
    pub async fn submit(
        &self,
        seed: &str,
        operations: Vec<Operation>,
        memo: Memo,
    ) -> Result<SubmitResponse, SubmitterError> {
        let keypair = Keypair::from_seed(seed).map_err(SubmitterError::Seed)?;
        let address = keypair.address();

        let mut accounts = self.accounts.lock().await;
        if !accounts.contains_key(&address) {
            let sequence = self.load_sequence(&address).await?;
            accounts.insert(address.clone(), Account { keypair, sequence });
        }
        let account = match accounts.get_mut(&address) {
            Some(account) => account,
            None => return Err(SubmitterError::Seed(LedgerError::InvalidSeed)),
        };

        let sequence = account.sequence + 1;
        let envelope = TransactionBuilder::new(address.clone(), sequence)
            .memo(memo)
            .operations(operations)
            .build()?
            .sign(&self.network_passphrase, &[&account.keypair])?
            .encode()?;

        let record = match &self.entity_manager {
            Some(em) => Some(
                em.insert_sent_transaction(NewSentTransaction {
                    source: address.clone(),
                    envelope: envelope.clone(),
                    submitted_at: (self.clock)(),
                })
                .await?,
            ),
            None => None,
        };

        let result = self.ledger.submit_transaction(&envelope).await;

        let outcome = match &result {
            Ok(response) => {
                account.sequence = sequence;
                metrics::record_submission("success");
                tracing::info!(account = %address, hash = %response.hash, "Transaction submitted");
                SentTransactionOutcome {
                    status: "success".to_string(),
                    transaction_hash: Some(response.hash.clone()),
                    ledger: response.ledger.map(|l| l as i64),
                    result: response.result_xdr.clone(),
                    succeeded_at: Some((self.clock)()),
                }
            }
            Err(e) => {
                metrics::record_submission("failure");
                tracing::warn!(account = %address, error = %e, "Transaction submission failed");
                if matches!(e, LedgerError::Rejected { .. }) {
                    // The ledger may have moved on; resync before the next attempt.
                    if let Ok(current) = self.load_sequence(&address).await {
                        account.sequence = current;
                    }
                }
                SentTransactionOutcome {
                    status: "failure".to_string(),
                    result: Some(e.to_string()),
                    ..Default::default()
                }
            }
        };

        // The ledger outcome stands even if recording it fails; an error here
        // would invite a resubmission of an applied transaction.
        if let (Some(em), Some(record)) = (&self.entity_manager, record) {
            if let Err(e) = em.finish_sent_transaction(record.id, outcome).await {
                tracing::error!(
                    account = %address,
                    record = record.id,
                    error = %e,
                    "Failed to record transaction outcome"
                );
            }
        }

        Ok(result?)
    }
}
