//! Core traits for the dynamic DNS monitor
//!
//! This module defines the collaborator interfaces the monitor depends on.
//!
//! - [`IpResolver`]: Determine the current public IP
//! - [`DnsProvider`]: Push an address to a dynamic DNS provider
//! - [`LogSink`]: Bounded history of monitor events
//! - [`ConfigStore`]: Durable storage of the monitor configuration
//! - [`Clock`]: Wall-clock time

pub mod clock;
pub mod config_store;
pub mod dns_provider;
pub mod ip_resolver;
pub mod log_sink;

pub use clock::{Clock, SystemClock};
pub use config_store::ConfigStore;
pub use dns_provider::{DnsProvider, ProviderOutcome, check_update_parameters};
pub use ip_resolver::IpResolver;
pub use log_sink::{LogEntry, LogKind, LogSink};
