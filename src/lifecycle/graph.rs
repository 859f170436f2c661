//! Explicit dependency graph.
//!
//! Every collaborator the request handler needs has exactly one typed slot.
//! Optional collaborators are slots of `Option<_>` and must still be filled,
//! with `None` when the feature is disabled, so a forgotten provider is an
//! error rather than a silent default.

use std::sync::Arc;

use thiserror::Error;

use crate::config::BridgeConfig;
use crate::db::{Driver, EntityManager, Repository};
use crate::discovery::{FederationClient, StellarTomlClient};
use crate::ledger::LedgerClient;
use crate::listener::PaymentListener;
use crate::submitter::TransactionSubmitter;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DependencyError {
    #[error("more than one provider registered for {0}")]
    Ambiguous(&'static str),

    #[error("no provider registered for {0}")]
    Unresolved(&'static str),
}

struct Slot<T> {
    name: &'static str,
    value: Option<T>,
}

impl<T> Slot<T> {
    fn new(name: &'static str) -> Self {
        Self { name, value: None }
    }

    fn fill(&mut self, value: T) -> Result<(), DependencyError> {
        if self.value.is_some() {
            return Err(DependencyError::Ambiguous(self.name));
        }
        self.value = Some(value);
        Ok(())
    }

    fn take(self) -> Result<T, DependencyError> {
        self.value.ok_or(DependencyError::Unresolved(self.name))
    }
}

/// Fully wired collaborators, immutable once built.
#[derive(Clone)]
pub struct Services {
    pub config: Arc<BridgeConfig>,
    pub ledger: Arc<dyn LedgerClient>,
    pub stellar_toml: StellarTomlClient,
    pub federation: FederationClient,
    pub driver: Option<Arc<dyn Driver>>,
    pub entity_manager: Option<EntityManager>,
    pub repository: Option<Repository>,
    pub submitter: Arc<TransactionSubmitter>,
    pub listener: Option<Arc<PaymentListener>>,
    pub http: reqwest::Client,
}

/// Collects providers, one per slot, then builds [`Services`].
pub struct GraphBuilder {
    config: Slot<Arc<BridgeConfig>>,
    ledger: Slot<Arc<dyn LedgerClient>>,
    stellar_toml: Slot<StellarTomlClient>,
    federation: Slot<FederationClient>,
    driver: Slot<Option<Arc<dyn Driver>>>,
    entity_manager: Slot<Option<EntityManager>>,
    repository: Slot<Option<Repository>>,
    submitter: Slot<Arc<TransactionSubmitter>>,
    listener: Slot<Option<Arc<PaymentListener>>>,
    http: Slot<reqwest::Client>,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self {
            config: Slot::new("configuration"),
            ledger: Slot::new("ledger client"),
            stellar_toml: Slot::new("stellar.toml client"),
            federation: Slot::new("federation client"),
            driver: Slot::new("database driver"),
            entity_manager: Slot::new("entity manager"),
            repository: Slot::new("repository"),
            submitter: Slot::new("transaction submitter"),
            listener: Slot::new("payment listener"),
            http: Slot::new("http client"),
        }
    }
}

impl GraphBuilder {
    pub fn config(&mut self, value: Arc<BridgeConfig>) -> Result<&mut Self, DependencyError> {
        self.config.fill(value)?;
        Ok(self)
    }

    pub fn ledger(&mut self, value: Arc<dyn LedgerClient>) -> Result<&mut Self, DependencyError> {
        self.ledger.fill(value)?;
        Ok(self)
    }

    pub fn stellar_toml(&mut self, value: StellarTomlClient) -> Result<&mut Self, DependencyError> {
        self.stellar_toml.fill(value)?;
        Ok(self)
    }

    pub fn federation(&mut self, value: FederationClient) -> Result<&mut Self, DependencyError> {
        self.federation.fill(value)?;
        Ok(self)
    }

    pub fn driver(
        &mut self,
        value: Option<Arc<dyn Driver>>,
    ) -> Result<&mut Self, DependencyError> {
        self.driver.fill(value)?;
        Ok(self)
    }

    pub fn entity_manager(
        &mut self,
        value: Option<EntityManager>,
    ) -> Result<&mut Self, DependencyError> {
        self.entity_manager.fill(value)?;
        Ok(self)
    }

    pub fn repository(&mut self, value: Option<Repository>) -> Result<&mut Self, DependencyError> {
        self.repository.fill(value)?;
        Ok(self)
    }

    pub fn submitter(
        &mut self,
        value: Arc<TransactionSubmitter>,
    ) -> Result<&mut Self, DependencyError> {
        self.submitter.fill(value)?;
        Ok(self)
    }

    pub fn listener(
        &mut self,
        value: Option<Arc<PaymentListener>>,
    ) -> Result<&mut Self, DependencyError> {
        self.listener.fill(value)?;
        Ok(self)
    }

    pub fn http_client(&mut self, value: reqwest::Client) -> Result<&mut Self, DependencyError> {
        self.http.fill(value)?;
        Ok(self)
    }

    /// Fails on the first slot left empty, in declaration order.
    pub fn build(self) -> Result<Services, DependencyError> {
        Ok(Services {
            config: self.config.take()?,
            ledger: self.ledger.take()?,
            stellar_toml: self.stellar_toml.take()?,
            federation: self.federation.take()?,
            driver: self.driver.take()?,
            entity_manager: self.entity_manager.take()?,
            repository: self.repository.take()?,
            submitter: self.submitter.take()?,
            listener: self.listener.take()?,
            http: self.http.take()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::system_clock;
    use crate::ledger::testing::MockLedger;

    fn populated() -> GraphBuilder {
        let http = reqwest::Client::new();
        let ledger: Arc<dyn LedgerClient> = Arc::new(MockLedger::default());
        let toml = StellarTomlClient::new(http.clone());
        let mut graph = GraphBuilder::default();
        graph
            .config(Arc::new(BridgeConfig::default()))
            .and_then(|g| g.ledger(ledger.clone()))
            .and_then(|g| g.stellar_toml(toml.clone()))
            .and_then(|g| g.federation(FederationClient::new(http.clone(), toml)))
            .and_then(|g| g.driver(None))
            .and_then(|g| g.entity_manager(None))
            .and_then(|g| g.repository(None))
            .and_then(|g| {
                g.submitter(Arc::new(TransactionSubmitter::new(
                    ledger,
                    None,
                    "Test SDF Network ; September 2015",
                    system_clock(),
                )))
            })
            .and_then(|g| g.listener(None))
            .and_then(|g| g.http_client(http))
            .unwrap();
        graph
    }

    #[test]
    fn test_build_complete_graph() {
        let services = populated().build().unwrap();
        assert!(services.repository.is_none());
        assert!(services.listener.is_none());
        assert_eq!(services.config.port, 8001);
    }

    #[test]
    fn test_second_provider_is_ambiguous() {
        let mut graph = populated();
        let err = graph.repository(None).err();
        assert_eq!(err, Some(DependencyError::Ambiguous("repository")));

        let err = graph.http_client(reqwest::Client::new()).err();
        assert_eq!(err, Some(DependencyError::Ambiguous("http client")));
    }

    #[test]
    fn test_missing_provider_is_unresolved() {
        let mut graph = GraphBuilder::default();
        graph.config(Arc::new(BridgeConfig::default())).unwrap();
        assert_eq!(
            graph.build().err(),
            Some(DependencyError::Unresolved("ledger client"))
        );
    }
}
