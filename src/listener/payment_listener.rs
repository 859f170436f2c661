//! Polls the ledger for payments to the receiving account and forwards them
//! to the receive callback.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::clock::Clock;
use crate::config::BridgeConfig;
use crate::db::{EntityManager, NewReceivedPayment, Repository};
use crate::ledger::keypair::is_valid_account_id;
use crate::ledger::{LedgerClient, PaymentRecord};
use crate::lifecycle::shutdown::{Shutdown, ShutdownSignal};
use crate::listener::{CallbackClient, ListenerError, PaymentStatus};
use crate::observability::metrics;
use crate::resilience::PollBackoff;

const BACKOFF_BASE: Duration = Duration::from_secs(1);
const BACKOFF_MAX: Duration = Duration::from_secs(60);

fn is_payment(kind: &str) -> bool {
    matches!(
        kind,
        "payment" | "path_payment" | "path_payment_strict_receive" | "path_payment_strict_send"
    )
}

/// Background payment listener.
pub struct PaymentListener {
    config: Arc<BridgeConfig>,
    receiving_account: String,
    callback: CallbackClient,
    entity_manager: EntityManager,
    repository: Repository,
    ledger: Arc<dyn LedgerClient>,
    clock: Clock,
    cursor: Mutex<Option<String>>,
    listening: AtomicBool,
    shutdown: Shutdown,
}

impl PaymentListener {
    pub fn new(
        config: Arc<BridgeConfig>,
        entity_manager: EntityManager,
        ledger: Arc<dyn LedgerClient>,
        repository: Repository,
        clock: Clock,
    ) -> Result<Self, ListenerError> {
        let receiving_account = config.accounts.receiving_account_id.clone();
        if !is_valid_account_id(&receiving_account) {
            return Err(ListenerError::Config(format!(
                "accounts.receiving_account_id '{}' is not an account id",
                receiving_account
            )));
        }
        let callback = CallbackClient::new(&config.callbacks.receive, &config.mac_key)?;

        Ok(Self {
            config,
            receiving_account,
            callback,
            entity_manager,
            repository,
            ledger,
            clock,
            cursor: Mutex::new(None),
            listening: AtomicBool::new(false),
            shutdown: Shutdown::new(),
        })
    }

    pub fn receiving_account(&self) -> &str {
        &self.receiving_account
    }

    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    /// Verify the receiving account, pick the starting cursor and spawn the
    /// poll loop. Fails if already listening.
    pub async fn listen(self: &Arc<Self>) -> Result<(), ListenerError> {
        if self.listening.swap(true, Ordering::SeqCst) {
            return Err(ListenerError::AlreadyListening);
        }

        let cursor = match self.starting_cursor().await {
            Ok(cursor) => cursor,
            Err(e) => {
                self.listening.store(false, Ordering::SeqCst);
                return Err(e);
            }
        };
        tracing::info!(
            account = %self.receiving_account,
            cursor = cursor.as_deref().unwrap_or("start"),
            "Payment listener started"
        );
        *self.cursor.lock().await = cursor;

        let shutdown = self.shutdown.subscribe();
        let listener = Arc::clone(self);
        tokio::spawn(async move { listener.run(shutdown).await });
        Ok(())
    }

    async fn starting_cursor(&self) -> Result<Option<String>, ListenerError> {
        self.ledger
            .load_account(&self.receiving_account)
            .await
            .map_err(|source| ListenerError::ReceivingAccount {
                account: self.receiving_account.clone(),
                source,
            })?;

        if let Some(cursor) = self.repository.last_cursor().await? {
            return Ok(Some(cursor));
        }
        Ok(self.ledger.latest_cursor(&self.receiving_account).await?)
    }

    async fn run(&self, mut shutdown: ShutdownSignal) {
        let interval = Duration::from_secs(self.config.listener.poll_interval_secs);
        let mut backoff = PollBackoff::new(BACKOFF_BASE, BACKOFF_MAX);

        loop {
            let delay = match self.poll_once().await {
                Ok(_) => {
                    backoff.reset();
                    interval
                }
                Err(e) => {
                    let delay = backoff.fail();
                    tracing::warn!(
                        error = %e,
                        failures = backoff.failures(),
                        delay_ms = delay.as_millis() as u64,
                        "Payment poll failed"
                    );
                    delay
                }
            };

            tokio::select! {
                _ = shutdown.wait() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        self.listening.store(false, Ordering::SeqCst);
        tracing::info!(account = %self.receiving_account, "Payment listener stopped");
    }

    /// Fetch one page after the cursor and process it in order.
    ///
    /// A failed receive callback is recorded as `callback_error` and the
    /// cursor moves on; such payments are retried through `reprocess`. Any
    /// other error stops the page with the cursor on the last handled payment.
    pub async fn poll_once(&self) -> Result<usize, ListenerError> {
        let mut cursor = self.cursor.lock().await;
        let payments = self
            .ledger
            .load_payments(
                &self.receiving_account,
                cursor.as_deref().unwrap_or_default(),
                self.config.listener.page_limit,
            )
            .await?;

        for payment in &payments {
            match self.process(payment, false).await {
                Ok(_) => {}
                Err(e @ (ListenerError::CallbackStatus(_) | ListenerError::CallbackTransport(_))) => {
                    tracing::warn!(
                        operation = %payment.id,
                        error = %e,
                        "Payment left for reprocessing"
                    );
                }
                Err(e) => return Err(e),
            }
            *cursor = Some(payment.paging_token.clone());
        }
        Ok(payments.len())
    }

    /// Classify `payment`, deliver it if accepted, and persist the outcome.
    ///
    /// Operations already recorded as successful are skipped unless `force`.
    /// A failed callback is recorded and then returned as an error.
    pub async fn process(
        &self,
        payment: &PaymentRecord,
        force: bool,
    ) -> Result<PaymentStatus, ListenerError> {
        if !force && self.already_succeeded(&payment.id).await? {
            tracing::debug!(operation = %payment.id, "Payment already processed");
            return Ok(PaymentStatus::AlreadyProcessed);
        }

        let mut failure = None;
        let status = if !is_payment(&payment.kind) {
            PaymentStatus::NotPaymentOperation
        } else if payment.to != self.receiving_account {
            PaymentStatus::OutgoingPayment
        } else if !self
            .config
            .accepts_asset(payment.asset_code(), &payment.asset_issuer)
        {
            PaymentStatus::AssetNotAllowed
        } else {
            match self.callback.send(payment).await {
                Ok(()) => PaymentStatus::Success,
                Err(e) => {
                    tracing::warn!(operation = %payment.id, error = %e, "Receive callback failed");
                    failure = Some(e);
                    PaymentStatus::CallbackError
                }
            }
        };

        self.entity_manager
            .persist_received_payment(NewReceivedPayment {
                operation_id: payment.id.clone(),
                paging_token: payment.paging_token.clone(),
                transaction_id: payment.transaction_hash.clone(),
                status: status.as_str().to_string(),
                processed_at: (self.clock)(),
            })
            .await?;
        metrics::record_received_payment(status.as_str());
        tracing::info!(operation = %payment.id, status = %status, "Payment processed");

        match failure {
            Some(e) => Err(e),
            None => Ok(status),
        }
    }

    /// Reload `operation_id` from the ledger and process it again.
    pub async fn reprocess(
        &self,
        operation_id: &str,
        force: bool,
    ) -> Result<PaymentStatus, ListenerError> {
        if !force && self.already_succeeded(operation_id).await? {
            return Err(ListenerError::AlreadyProcessed(operation_id.to_string()));
        }
        let payment = self.ledger.load_operation(operation_id).await?;
        self.process(&payment, true).await
    }

    async fn already_succeeded(&self, operation_id: &str) -> Result<bool, ListenerError> {
        let existing = self
            .repository
            .received_payment_by_operation_id(operation_id)
            .await?;
        Ok(existing.is_some_and(|row| row.status == PaymentStatus::Success.as_str()))
    }

    /// Stop the poll loop after its current iteration.
    pub fn stop(&self) {
        self.shutdown.trigger();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::system_clock;
    use crate::config::{AssetConfig, BridgeConfig};
    use crate::db::testing::SqliteDriver;
    use crate::ledger::testing::MockLedger;
    use crate::ledger::Keypair;
    use axum::{extract::State, http::StatusCode, routing::post, Router};
    use std::sync::Mutex as StdMutex;

    type Received = Arc<StdMutex<Vec<String>>>;

    async fn spawn_callback(status: StatusCode) -> (String, Received) {
        spawn_callback_with(move |_| status).await
    }

    /// Callback server answering each body with `respond(body)`.
    async fn spawn_callback_with(
        respond: impl Fn(&str) -> StatusCode + Clone + Send + Sync + 'static,
    ) -> (String, Received) {
        let received: Received = Arc::default();
        let app = Router::new()
            .route(
                "/receive",
                post(move |State(received): State<Received>, body: String| async move {
                    let status = respond(&body);
                    received.lock().unwrap().push(body);
                    status
                }),
            )
            .with_state(received.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}/receive", addr), received)
    }

    fn config(receiving: &str, callback: &str) -> Arc<BridgeConfig> {
        let mut config = BridgeConfig::default();
        config.accounts.receiving_account_id = receiving.to_string();
        config.callbacks.receive = callback.to_string();
        config.assets = vec![AssetConfig {
            code: "XLM".into(),
            issuer: String::new(),
        }];
        Arc::new(config)
    }

    fn native_payment(id: u64, to: &str) -> PaymentRecord {
        PaymentRecord {
            id: id.to_string(),
            paging_token: id.to_string(),
            kind: "payment".into(),
            from: Keypair::random().address(),
            to: to.to_string(),
            amount: "5".into(),
            asset_type: "native".into(),
            transaction_hash: format!("tx{id}"),
            ..Default::default()
        }
    }

    async fn listener(
        callback: &str,
        ledger: Arc<MockLedger>,
    ) -> (Arc<PaymentListener>, Repository, String) {
        let receiving = Keypair::random().address();
        let driver = SqliteDriver::migrated().await;
        let listener = PaymentListener::new(
            config(&receiving, callback),
            EntityManager::new(driver.clone()),
            ledger,
            Repository::new(driver.clone()),
            system_clock(),
        )
        .unwrap();
        (Arc::new(listener), Repository::new(driver), receiving)
    }

    #[tokio::test]
    async fn test_rejects_invalid_configuration() {
        let driver = SqliteDriver::migrated().await;
        let result = PaymentListener::new(
            config("GBAD", "http://localhost/receive"),
            EntityManager::new(driver.clone()),
            Arc::new(MockLedger::default()),
            Repository::new(driver),
            system_clock(),
        );
        assert!(matches!(result, Err(ListenerError::Config(_))));
    }

    #[tokio::test]
    async fn test_classifies_and_delivers() {
        let (url, received) = spawn_callback(StatusCode::OK).await;
        let ledger = Arc::new(MockLedger::default());
        let (listener, repository, receiving) = listener(&url, ledger.clone()).await;

        ledger.push_payment(native_payment(1, &receiving));
        ledger.push_payment(native_payment(2, &Keypair::random().address()));
        ledger.push_payment(PaymentRecord {
            kind: "create_account".into(),
            ..native_payment(3, &receiving)
        });
        ledger.push_payment(PaymentRecord {
            asset_type: "credit_alphanum4".into(),
            asset_code: "EUR".into(),
            asset_issuer: Keypair::random().address(),
            ..native_payment(4, &receiving)
        });

        assert_eq!(listener.poll_once().await.unwrap(), 4);
        assert_eq!(received.lock().unwrap().len(), 1);

        let status = |id: &'static str| {
            let repository = repository.clone();
            async move {
                repository
                    .received_payment_by_operation_id(id)
                    .await
                    .unwrap()
                    .unwrap()
                    .status
            }
        };
        assert_eq!(status("1").await, "success");
        assert_eq!(status("2").await, "outgoing_payment");
        assert_eq!(status("3").await, "not_payment_operation");
        assert_eq!(status("4").await, "asset_not_allowed");

        // Cursor advanced past the page.
        assert_eq!(listener.poll_once().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_callback_failure_does_not_block_later_payments() {
        let (url, received) = spawn_callback_with(|body: &str| {
            if body.starts_with("id=1&") {
                StatusCode::INTERNAL_SERVER_ERROR
            } else {
                StatusCode::OK
            }
        })
        .await;
        let ledger = Arc::new(MockLedger::default());
        let (listener, repository, receiving) = listener(&url, ledger.clone()).await;
        ledger.push_payment(native_payment(1, &receiving));
        ledger.push_payment(native_payment(2, &receiving));

        assert_eq!(listener.poll_once().await.unwrap(), 2);
        assert_eq!(received.lock().unwrap().len(), 2);

        let first = repository
            .received_payment_by_operation_id("1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.status, "callback_error");
        let second = repository
            .received_payment_by_operation_id("2")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second.status, "success");

        // The failed payment is not redelivered by later polls.
        for _ in 0..3 {
            assert_eq!(listener.poll_once().await.unwrap(), 0);
        }
        assert_eq!(received.lock().unwrap().len(), 2);

        ledger.push_payment(native_payment(3, &receiving));
        assert_eq!(listener.poll_once().await.unwrap(), 1);
        assert_eq!(received.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_failed_callback_retried_through_reprocess() {
        let (url, received) = spawn_callback(StatusCode::INTERNAL_SERVER_ERROR).await;
        let ledger = Arc::new(MockLedger::default());
        let (listener, _, receiving) = listener(&url, ledger.clone()).await;
        ledger.push_payment(native_payment(1, &receiving));

        assert_eq!(listener.poll_once().await.unwrap(), 1);
        assert!(matches!(
            listener.reprocess("1", false).await,
            Err(ListenerError::CallbackStatus(500))
        ));
        assert_eq!(received.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_reprocess_respects_force() {
        let (url, received) = spawn_callback(StatusCode::OK).await;
        let ledger = Arc::new(MockLedger::default());
        let (listener, _, receiving) = listener(&url, ledger.clone()).await;
        ledger.push_payment(native_payment(9, &receiving));

        assert_eq!(
            listener.reprocess("9", false).await.unwrap(),
            PaymentStatus::Success
        );
        assert!(matches!(
            listener.reprocess("9", false).await,
            Err(ListenerError::AlreadyProcessed(_))
        ));
        assert_eq!(
            listener.reprocess("9", true).await.unwrap(),
            PaymentStatus::Success
        );
        assert_eq!(received.lock().unwrap().len(), 2);

        assert!(matches!(
            listener.reprocess("404", false).await,
            Err(ListenerError::Ledger(_))
        ));
    }

    #[tokio::test]
    async fn test_listen_requires_receiving_account() {
        let ledger = Arc::new(MockLedger::default());
        let (listener, _, _) = listener("http://127.0.0.1:9/receive", ledger).await;
        assert!(matches!(
            listener.listen().await,
            Err(ListenerError::ReceivingAccount { .. })
        ));
        assert!(!listener.is_listening());
    }

    #[tokio::test]
    async fn test_listen_once_and_stop() {
        let receiving = Keypair::random().address();
        let ledger = Arc::new(MockLedger::default().with_account(&receiving, 1));
        let driver = SqliteDriver::migrated().await;
        let listener = Arc::new(
            PaymentListener::new(
                config(&receiving, "http://127.0.0.1:9/receive"),
                EntityManager::new(driver.clone()),
                ledger,
                Repository::new(driver),
                system_clock(),
            )
            .unwrap(),
        );

        listener.listen().await.unwrap();
        assert!(listener.is_listening());
        assert!(matches!(
            listener.listen().await,
            Err(ListenerError::AlreadyListening)
        ));

        listener.stop();
        for _ in 0..50 {
            if !listener.is_listening() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(!listener.is_listening());
    }
}
