//! The identity service orchestrator.
//!
//! Opens the configured store, builds the lifecycle manager and serves the
//! HTTP API until shut down.

use anyhow::Result;
use std::future::Future;
use std::sync::Arc;

use plutor_onboarding::IdentityLifecycleManager;
use plutor_store::IdentityStore;

use crate::api::{start_api_server, AppState};
use crate::config::{PlutorConfig, StorageBackend};
use crate::mailer::{LogMailer, VerificationMailer};

pub struct PlutorNode {
    config: PlutorConfig,
    state: Arc<AppState>,
}

impl PlutorNode {
    /// Create a node with the logging mailer.
    pub fn new(config: PlutorConfig) -> Result<Self> {
        Self::with_mailer(config, Arc::new(LogMailer))
    }

    pub fn with_mailer(config: PlutorConfig, mailer: Arc<dyn VerificationMailer>) -> Result<Self> {
        let store = match config.storage.backend {
            StorageBackend::Memory => IdentityStore::memory(),
            StorageBackend::Rocksdb => {
                std::fs::create_dir_all(&config.storage.data_dir)?;
                IdentityStore::open_rocksdb(&config.storage.data_dir)?
            }
        };
        tracing::info!(
            backend = %config.storage.backend,
            data_dir = %config.storage.data_dir.display(),
            mailer = mailer.name(),
            "identity store opened"
        );

        let manager = IdentityLifecycleManager::new(store, config.identity.clone())?;
        let state = Arc::new(AppState {
            manager: Arc::new(manager),
            mailer,
        });
        Ok(Self { config, state })
    }

    pub fn state(&self) -> Arc<AppState> {
        self.state.clone()
    }

    pub fn config(&self) -> &PlutorConfig {
        &self.config
    }

    /// Serve the HTTP API until `shutdown` resolves.
    pub async fn run<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.api_addr()?;
        start_api_server(addr, self.state.clone(), shutdown).await
    }

    /// Flush the store.
    pub async fn shutdown(&self) -> Result<()> {
        self.state.manager.close().await?;
        tracing::info!("node shut down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_node() {
        let mut config = PlutorConfig::default();
        config.storage.backend = StorageBackend::Memory;
        let node = PlutorNode::new(config).unwrap();
        assert_eq!(node.state().manager.store().backend_name(), "memory");
        node.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_rocksdb_node_creates_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = PlutorConfig::default();
        config.storage.data_dir = dir.path().join("identity");
        let node = PlutorNode::new(config).unwrap();
        assert_eq!(node.state().manager.store().backend_name(), "rocksdb");
        assert!(dir.path().join("identity").exists());
        node.shutdown().await.unwrap();
    }
}
