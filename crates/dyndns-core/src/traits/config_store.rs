// # Config Store Trait
//
// Defines the interface for durable storage of the monitor configuration.
//
// ## Purpose
//
// The monitor itself never persists anything. Whoever owns the process (the
// daemon, an embedding application) loads the configuration through this
// trait before calling `Monitor::start()` and saves it after edits.
//
// ## Implementations
//
// - In-memory: `dyndns_core::store::MemoryConfigStore`
// - JSON file with backup and atomic writes: `dyndns_core::store::FileConfigStore`
//
// ## Usage
//
// ```rust,ignore
// use dyndns_core::ConfigStore;
//
// let store = /* ConfigStore implementation */;
// if let Some(config) = store.load().await? {
//     monitor.start(config)?;
// }
// ```

use async_trait::async_trait;

use crate::config::MonitorConfig;

/// Trait for configuration store implementations
///
/// # Implementation Guidelines
///
/// - **Async I/O only**: Never block the runtime
/// - **Durable save**: `save()` returns only once the configuration is stored
/// - **Thread-safe**: All methods must be safe to call concurrently
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Load the stored configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Some(MonitorConfig))`: The stored configuration
    /// - `Ok(None)`: Nothing stored yet
    /// - `Err(Error)`: Storage error
    async fn load(&self) -> Result<Option<MonitorConfig>, crate::Error>;

    /// Replace the stored configuration
    async fn save(&self, config: &MonitorConfig) -> Result<(), crate::Error>;
}
