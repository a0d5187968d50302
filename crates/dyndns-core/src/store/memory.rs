// # Memory Config Store
//
// In-memory implementation of ConfigStore. Nothing survives a restart.
// Useful for tests and embedders that manage persistence themselves.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::config::MonitorConfig;
use crate::traits::config_store::ConfigStore;

/// In-memory configuration store
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigStore {
    inner: Arc<RwLock<Option<MonitorConfig>>>,
}

impl MemoryConfigStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `config`
    pub fn with_config(config: MonitorConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(config))),
        }
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn load(&self) -> Result<Option<MonitorConfig>, Error> {
        Ok(self.inner.read().await.clone())
    }

    async fn save(&self, config: &MonitorConfig) -> Result<(), Error> {
        *self.inner.write().await = Some(config.clone());
        Ok(())
    }
}
