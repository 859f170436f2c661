//! Startup orchestration.
//!
//! # Responsibilities
//! - Resolve the run mode once and dispatch on it
//! - Run the named initialization steps in order, stopping on the first fatal one
//! - Compose the dependency graph and the HTTP application
//!
//! # Design Decisions
//! - Version is answered before the config file is read
//! - Migration only needs the driver; no ledger or HTTP component is built
//! - Each step reports `Done`, `Skipped(reason)` or a fatal `StartupError`

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::clock::{system_clock, Clock};
use crate::config::{check_api_key, load_config, BridgeConfig, ConfigError};
use crate::db::{migrations, DbError, Driver, DriverKind, EntityManager, Repository};
use crate::discovery::{self, FederationClient, StellarTomlClient};
use crate::http::{App, RequestHandler};
use crate::ledger::{HorizonClient, LedgerClient, LedgerError};
use crate::lifecycle::graph::{DependencyError, GraphBuilder};
use crate::listener::{ListenerError, PaymentListener};
use crate::observability::metrics;
use crate::submitter::{SubmitterError, TransactionSubmitter};

/// Per-request timeout of the Horizon client.
const LEDGER_TIMEOUT: Duration = Duration::from_secs(30);

/// Fatal startup conditions. Each one ends the process with a non-zero status.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cannot connect to database: {0}")]
    Connection(#[source] DbError),

    #[error("no database driver")]
    NoDriver,

    #[error("migration failed: {0}")]
    Migration(#[source] DbError),

    #[error("cannot initialize {param}: {source}")]
    AccountInit {
        param: &'static str,
        #[source]
        source: SubmitterError,
    },

    #[error("cannot start payment listener: {0}")]
    ListenerActivation(#[from] ListenerError),

    #[error("dependency graph: {0}")]
    Dependency(#[from] DependencyError),

    #[error("cannot create ledger client: {0}")]
    Ledger(#[from] LedgerError),

    #[error("cannot create http client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("http server failed: {0}")]
    Serve(#[source] std::io::Error),
}

/// How the process should run, resolved once from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    #[default]
    Serve,
    Migrate,
    Version,
}

impl RunMode {
    /// `--migrate` wins over `--version` when both are given.
    pub fn from_flags(migrate: bool, version: bool) -> Self {
        match (migrate, version) {
            (true, _) => Self::Migrate,
            (false, true) => Self::Version,
            (false, false) => Self::Serve,
        }
    }
}

/// A terminal mode that completed successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Version,
    Migrated(usize),
}

/// Result of a successful bootstrap.
pub enum Launch {
    Exit(Exit),
    Serve(App),
}

/// `Bridge Server Version: <version>`
pub fn version_banner() -> String {
    format!("Bridge Server Version: {}", env!("CARGO_PKG_VERSION"))
}

/// Outcome of a non-fatal step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Done,
    Skipped(String),
}

/// State threaded through the initialization steps.
pub struct StartupContext {
    config: Arc<BridgeConfig>,
    ledger: Option<Arc<dyn LedgerClient>>,
    clock: Clock,
    driver_override: Option<Arc<dyn Driver>>,
    driver: Option<Arc<dyn Driver>>,
    entity_manager: Option<EntityManager>,
    repository: Option<Repository>,
    submitter: Option<Arc<TransactionSubmitter>>,
    listener: Option<Arc<PaymentListener>>,
}

impl StartupContext {
    fn ledger(&self) -> Result<Arc<dyn LedgerClient>, StartupError> {
        self.ledger
            .clone()
            .ok_or(StartupError::Dependency(DependencyError::Unresolved("ledger client")))
    }

    fn submitter(&self) -> Result<&Arc<TransactionSubmitter>, StartupError> {
        self.submitter
            .as_ref()
            .ok_or(StartupError::Dependency(DependencyError::Unresolved(
                "transaction submitter",
            )))
    }
}

/// One named initialization step.
#[async_trait]
pub trait InitStep: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, ctx: &mut StartupContext) -> Result<StepOutcome, StartupError>;
}

/// Maps `database.type` to a driver, or to no persistence.
struct SelectDriver;

#[async_trait]
impl InitStep for SelectDriver {
    fn name(&self) -> &'static str {
        "select_driver"
    }

    async fn run(&self, ctx: &mut StartupContext) -> Result<StepOutcome, StartupError> {
        match DriverKind::select(&ctx.config.database.kind)? {
            Some(kind) => {
                let driver = ctx
                    .driver_override
                    .clone()
                    .unwrap_or_else(|| kind.driver());
                tracing::info!(driver = driver.name(), "Database driver selected");
                ctx.driver = Some(driver);
                Ok(StepOutcome::Done)
            }
            None => Ok(StepOutcome::Skipped(
                "database.type is empty, running without persistence".to_string(),
            )),
        }
    }
}

/// Rejects configured API keys shorter than the minimum.
struct ApiKeyPolicy;

#[async_trait]
impl InitStep for ApiKeyPolicy {
    fn name(&self) -> &'static str {
        "api_key_policy"
    }

    async fn run(&self, ctx: &mut StartupContext) -> Result<StepOutcome, StartupError> {
        check_api_key(&ctx.config.api_key)?;
        if ctx.config.api_key.is_empty() {
            return Ok(StepOutcome::Skipped(
                "api_key is not set, requests are not authenticated".to_string(),
            ));
        }
        Ok(StepOutcome::Done)
    }
}

/// Connects the driver and derives the entity manager and repository.
struct Persistence;

#[async_trait]
impl InitStep for Persistence {
    fn name(&self) -> &'static str {
        "persistence"
    }

    async fn run(&self, ctx: &mut StartupContext) -> Result<StepOutcome, StartupError> {
        let Some(driver) = ctx.driver.clone() else {
            return Ok(StepOutcome::Skipped("no database driver selected".to_string()));
        };
        driver
            .connect(&ctx.config.database.url)
            .await
            .map_err(StartupError::Connection)?;

        ctx.entity_manager = Some(EntityManager::new(driver.clone()));
        ctx.repository = Some(Repository::new(driver));
        Ok(StepOutcome::Done)
    }
}

struct CreateSubmitter;

#[async_trait]
impl InitStep for CreateSubmitter {
    fn name(&self) -> &'static str {
        "transaction_submitter"
    }

    async fn run(&self, ctx: &mut StartupContext) -> Result<StepOutcome, StartupError> {
        ctx.submitter = Some(Arc::new(TransactionSubmitter::new(
            ctx.ledger()?,
            ctx.entity_manager.clone(),
            ctx.config.network_passphrase.clone(),
            ctx.clock.clone(),
        )));
        Ok(StepOutcome::Done)
    }
}

/// Registers one signing account with the submitter.
struct InitAccount {
    name: &'static str,
    param: &'static str,
    seed: fn(&BridgeConfig) -> &str,
}

#[async_trait]
impl InitStep for InitAccount {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn run(&self, ctx: &mut StartupContext) -> Result<StepOutcome, StartupError> {
        let seed = (self.seed)(&ctx.config);
        if seed.is_empty() {
            return Ok(StepOutcome::Skipped(format!("no {} param", self.param)));
        }
        ctx.submitter()?
            .init_account(seed)
            .await
            .map_err(|source| StartupError::AccountInit {
                param: self.param,
                source,
            })?;
        Ok(StepOutcome::Done)
    }
}

/// Starts the payment listener when its account, callback and persistence exist.
struct PaymentListenerStep;

#[async_trait]
impl InitStep for PaymentListenerStep {
    fn name(&self) -> &'static str {
        "payment_listener"
    }

    async fn run(&self, ctx: &mut StartupContext) -> Result<StepOutcome, StartupError> {
        if ctx.config.accounts.receiving_account_id.is_empty() {
            return Ok(StepOutcome::Skipped(
                "no accounts.receiving_account_id param".to_string(),
            ));
        }
        if ctx.config.callbacks.receive.is_empty() {
            return Ok(StepOutcome::Skipped("no callbacks.receive param".to_string()));
        }
        let (Some(entity_manager), Some(repository)) =
            (ctx.entity_manager.clone(), ctx.repository.clone())
        else {
            return Ok(StepOutcome::Skipped(
                "payment listener requires a database".to_string(),
            ));
        };

        let listener = Arc::new(PaymentListener::new(
            ctx.config.clone(),
            entity_manager,
            ctx.ledger()?,
            repository,
            ctx.clock.clone(),
        )?);
        listener.listen().await?;
        ctx.listener = Some(listener);
        Ok(StepOutcome::Done)
    }
}

fn authorizing_seed(config: &BridgeConfig) -> &str {
    &config.accounts.authorizing_seed
}

fn base_seed(config: &BridgeConfig) -> &str {
    &config.accounts.base_seed
}

fn migrate_steps() -> Vec<Box<dyn InitStep>> {
    vec![Box::new(SelectDriver), Box::new(Persistence)]
}

fn serve_steps() -> Vec<Box<dyn InitStep>> {
    vec![
        Box::new(SelectDriver),
        Box::new(ApiKeyPolicy),
        Box::new(Persistence),
        Box::new(CreateSubmitter),
        Box::new(InitAccount {
            name: "authorizing_account",
            param: "accounts.authorizing_seed",
            seed: authorizing_seed,
        }),
        Box::new(InitAccount {
            name: "base_account",
            param: "accounts.base_seed",
            seed: base_seed,
        }),
        Box::new(PaymentListenerStep),
    ]
}

/// Run `steps` in order, stopping on the first fatal error.
async fn run_steps(
    steps: &[Box<dyn InitStep>],
    ctx: &mut StartupContext,
) -> Result<(), StartupError> {
    for step in steps {
        let name = step.name();
        match step.run(ctx).await {
            Ok(StepOutcome::Done) => {
                tracing::info!(step = name, "Startup step complete");
                metrics::record_startup_step(name, "ok");
            }
            Ok(StepOutcome::Skipped(reason)) => {
                tracing::warn!(step = name, reason = %reason, "Startup step skipped");
                metrics::record_startup_step(name, "skipped");
            }
            Err(e) => {
                metrics::record_startup_step(name, "fatal");
                return Err(e);
            }
        }
    }
    Ok(())
}

/// Builds the application from an in-memory configuration.
///
/// The driver, ledger client and clock can be replaced before launching.
pub struct Bootstrap {
    config: Arc<BridgeConfig>,
    driver: Option<Arc<dyn Driver>>,
    ledger: Option<Arc<dyn LedgerClient>>,
    clock: Clock,
}

impl Bootstrap {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config: Arc::new(config),
            driver: None,
            ledger: None,
            clock: system_clock(),
        }
    }

    /// Use `driver` instead of the one `database.type` selects. An empty
    /// `database.type` still means no persistence.
    pub fn with_driver(mut self, driver: Arc<dyn Driver>) -> Self {
        self.driver = Some(driver);
        self
    }

    pub fn with_ledger(mut self, ledger: Arc<dyn LedgerClient>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub async fn launch(self, mode: RunMode) -> Result<Launch, StartupError> {
        match mode {
            RunMode::Version => Ok(Launch::Exit(Exit::Version)),
            RunMode::Migrate => self.migrate().await.map(|n| Launch::Exit(Exit::Migrated(n))),
            RunMode::Serve => self.compose().await.map(Launch::Serve),
        }
    }

    fn context(self, ledger: Option<Arc<dyn LedgerClient>>) -> StartupContext {
        StartupContext {
            config: self.config,
            ledger,
            clock: self.clock,
            driver_override: self.driver,
            driver: None,
            entity_manager: None,
            repository: None,
            submitter: None,
            listener: None,
        }
    }

    async fn migrate(self) -> Result<usize, StartupError> {
        let mut ctx = self.context(None);
        run_steps(&migrate_steps(), &mut ctx).await?;

        let driver = ctx.driver.ok_or(StartupError::NoDriver)?;
        let applied = driver
            .migrate_up(migrations::GATEWAY)
            .await
            .map_err(StartupError::Migration)?;
        tracing::info!(applied, "Applied migrations");
        Ok(applied)
    }

    async fn compose(mut self) -> Result<App, StartupError> {
        let ledger = match self.ledger.take() {
            Some(ledger) => ledger,
            None => Arc::new(HorizonClient::new(&self.config.horizon, LEDGER_TIMEOUT)?),
        };
        let mut ctx = self.context(Some(ledger));
        run_steps(&serve_steps(), &mut ctx).await?;

        let http = discovery::http_client()?;
        let stellar_toml = StellarTomlClient::new(http.clone());
        let federation = FederationClient::new(http.clone(), stellar_toml.clone());
        let submitter = ctx.submitter()?.clone();

        let mut graph = GraphBuilder::default();
        graph
            .config(ctx.config.clone())?
            .ledger(ctx.ledger()?)?
            .stellar_toml(stellar_toml)?
            .federation(federation)?
            .driver(ctx.driver)?
            .entity_manager(ctx.entity_manager)?
            .repository(ctx.repository)?
            .submitter(submitter)?
            .listener(ctx.listener)?
            .http_client(http)?;
        let services = graph.build()?;

        let handler = Arc::new(RequestHandler::new(services));
        Ok(App::new(ctx.config, handler))
    }
}

/// Process entry point behind the `bridge` binary.
pub async fn run(config_path: &Path, mode: RunMode) -> Result<(), StartupError> {
    if mode == RunMode::Version {
        println!("{}", version_banner());
        return Ok(());
    }

    let config = load_config(config_path)?;
    tracing::info!(path = %config_path.display(), port = config.port, "Configuration loaded");

    // Checked by validate_config when metrics are enabled.
    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    match Bootstrap::new(config).launch(mode).await? {
        Launch::Serve(app) => app.serve().await?,
        Launch::Exit(exit) => tracing::debug!(?exit, "Finished without serving"),
    }
    Ok(())
}
