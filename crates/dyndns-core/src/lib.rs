// # dyndns-core
//
// Core library for the dynamic DNS IP monitor.
//
// ## Architecture Overview
//
// This library keeps one hostname at one provider in sync with the current
// public IP:
// - **IpResolver**: Trait for determining the current public IP
// - **DnsProvider**: Trait for pushing an address to a provider
// - **LogSink**: Trait for the bounded event history
// - **ConfigStore**: Trait for durable configuration storage
// - **Monitor**: The reconciliation loop tying them together
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from HTTP implementations
// 2. **Single Cycle**: At most one resolve-then-update cycle is ever in flight
// 3. **Library-First**: The daemon is a thin wrapper over this crate
// 4. **Failures Are Logged**: No cycle outcome escalates out of the loop

pub mod config;
pub mod engine;
pub mod error;
pub mod ip;
pub mod log;
pub mod store;
pub mod traits;

// Re-export core types for convenience
pub use config::{Credentials, MonitorConfig, ProviderKind, ResolverConfig};
pub use engine::{CycleOutcome, Monitor, MonitorPhase, MonitorState};
pub use error::{Error, ResolutionError, Result, UpdateError};
pub use ip::PublicIp;
pub use log::MemoryLogSink;
pub use store::{FileConfigStore, MemoryConfigStore};
pub use traits::{
    Clock, ConfigStore, DnsProvider, IpResolver, LogEntry, LogKind, LogSink, ProviderOutcome,
    SystemClock,
};
