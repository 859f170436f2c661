//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, OnceLock};

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::response::Response;
use axum::routing::post;
use axum::Router;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tower::ServiceExt;

use bridge_server::config::BridgeConfig;
use bridge_server::db::{migrations, DbError, DbResult, Driver};
use bridge_server::ledger::{
    AccountResponse, Keypair, LedgerClient, LedgerError, LedgerResult, PaymentRecord,
    SubmitResponse,
};
use bridge_server::{App, Bootstrap, Launch, RunMode, StartupError};

/// Driver double that records every call and never opens a connection.
#[derive(Default)]
pub struct MockDriver {
    calls: Mutex<Vec<String>>,
    fail_connect: bool,
}

impl MockDriver {
    pub fn failing() -> Self {
        Self {
            fail_connect: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Driver for MockDriver {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn connect(&self, url: &str) -> DbResult<()> {
        self.calls.lock().unwrap().push(format!("connect:{url}"));
        if self.fail_connect {
            return Err(DbError::Database("connection refused".into()));
        }
        Ok(())
    }

    async fn migrate_up(&self, migration_set: &str) -> DbResult<usize> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("migrate_up:{migration_set}"));
        Ok(2)
    }

    fn connection(&self) -> DbResult<&DatabaseConnection> {
        Err(DbError::NotConnected)
    }
}

/// In-memory SQLite driver; the gateway schema is applied on connect.
#[derive(Default)]
pub struct SqliteDriver {
    connection: OnceLock<DatabaseConnection>,
}

#[async_trait]
impl Driver for SqliteDriver {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn connect(&self, _url: &str) -> DbResult<()> {
        let mut options = ConnectOptions::new("sqlite::memory:".to_string());
        options.max_connections(1).sqlx_logging(false);
        let connection = Database::connect(options).await?;
        migrations::migrate_up(&connection, migrations::GATEWAY).await?;
        self.connection
            .set(connection)
            .map_err(|_| DbError::AlreadyConnected)
    }

    async fn migrate_up(&self, migration_set: &str) -> DbResult<usize> {
        migrations::migrate_up(self.connection()?, migration_set).await
    }

    fn connection(&self) -> DbResult<&DatabaseConnection> {
        self.connection.get().ok_or(DbError::NotConnected)
    }
}

/// Ledger double with a fixed account table and an operation list.
#[derive(Default)]
pub struct MockLedger {
    accounts: Mutex<HashMap<String, u64>>,
    operations: Mutex<Vec<PaymentRecord>>,
    submitted: Mutex<Vec<String>>,
}

impl MockLedger {
    pub fn with_account(self, account_id: &str, sequence: u64) -> Self {
        self.accounts
            .lock()
            .unwrap()
            .insert(account_id.to_string(), sequence);
        self
    }

    pub fn push_operation(&self, operation: PaymentRecord) {
        self.operations.lock().unwrap().push(operation);
    }

    pub fn submitted(&self) -> Vec<String> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn load_account(&self, account_id: &str) -> LedgerResult<AccountResponse> {
        let sequence = *self
            .accounts
            .lock()
            .unwrap()
            .get(account_id)
            .ok_or_else(|| LedgerError::NotFound(format!("account {account_id}")))?;
        Ok(AccountResponse {
            account_id: account_id.to_string(),
            sequence: sequence.to_string(),
        })
    }

    async fn submit_transaction(&self, envelope: &str) -> LedgerResult<SubmitResponse> {
        let mut submitted = self.submitted.lock().unwrap();
        submitted.push(envelope.to_string());
        Ok(SubmitResponse {
            hash: format!("hash-{}", submitted.len()),
            ledger: Some(100 + submitted.len() as u64),
            result_xdr: None,
        })
    }

    async fn load_payments(
        &self,
        _account_id: &str,
        _cursor: &str,
        _limit: u32,
    ) -> LedgerResult<Vec<PaymentRecord>> {
        Ok(Vec::new())
    }

    async fn load_operation(&self, operation_id: &str) -> LedgerResult<PaymentRecord> {
        self.operations
            .lock()
            .unwrap()
            .iter()
            .find(|op| op.id == operation_id)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("operation {operation_id}")))
    }

    async fn latest_cursor(&self, _account_id: &str) -> LedgerResult<Option<String>> {
        Ok(None)
    }
}

/// A request captured by [`start_capture_server`].
#[derive(Debug, Clone)]
pub struct Captured {
    pub headers: HeaderMap,
    pub body: String,
}

pub type CapturedRequests = Arc<Mutex<Vec<Captured>>>;

/// Start a callback endpoint on an ephemeral port that records each POST to
/// `/receive` and answers `status`.
pub async fn start_capture_server(status: StatusCode) -> (String, CapturedRequests) {
    let captured: CapturedRequests = Arc::default();
    let app = Router::new()
        .route(
            "/receive",
            post(
                move |State(captured): State<CapturedRequests>, headers: HeaderMap, body: String| async move {
                    captured.lock().unwrap().push(Captured { headers, body });
                    status
                },
            ),
        )
        .with_state(captured.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/receive"), captured)
}

/// Start a bare HTTP/1.1 server that reads each request head and answers
/// with `body` as text/html.
pub async fn start_static_server(body: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut head = Vec::new();
                        let mut buf = [0u8; 1024];
                        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                            match socket.read(&mut buf).await {
                                Ok(0) | Err(_) => return,
                                Ok(n) => head.extend_from_slice(&buf[..n]),
                            }
                        }
                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });
    addr
}

/// A config with a mysql database type, so an overriding driver is used.
pub fn config_with_database() -> BridgeConfig {
    let mut config = BridgeConfig::default();
    config.database.kind = "mysql".into();
    config.database.url = "mysql://bridge@localhost/bridge".into();
    config
}

pub async fn launch(
    config: BridgeConfig,
    mode: RunMode,
    driver: Arc<dyn Driver>,
    ledger: Arc<dyn LedgerClient>,
) -> Result<Launch, StartupError> {
    Bootstrap::new(config)
        .with_driver(driver)
        .with_ledger(ledger)
        .launch(mode)
        .await
}

/// Launch in serve mode and unwrap the application.
pub async fn serve_app(
    config: BridgeConfig,
    driver: Arc<dyn Driver>,
    ledger: Arc<dyn LedgerClient>,
) -> App {
    match launch(config, RunMode::Serve, driver, ledger).await {
        Ok(Launch::Serve(app)) => app,
        Ok(Launch::Exit(exit)) => panic!("expected serve, got {exit:?}"),
        Err(e) => panic!("startup failed: {e}"),
    }
}

pub async fn send(app: &App, request: Request<Body>) -> Response {
    app.service().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_form(uri: &str, form: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap()
}

pub fn funded_account(ledger: MockLedger) -> (Keypair, MockLedger) {
    let keypair = Keypair::random();
    let ledger = ledger.with_account(&keypair.address(), 1);
    (keypair, ledger)
}
