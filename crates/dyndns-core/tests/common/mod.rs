//! Test doubles and common utilities for the monitor contract tests
//!
//! The doubles record every call so tests can assert on call counts,
//! ordering and overlap without real network access.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use dyndns_core::traits::check_update_parameters;
use dyndns_core::{
    Clock, Credentials, DnsProvider, IpResolver, MemoryLogSink, Monitor, MonitorConfig,
    ProviderKind, ProviderOutcome, PublicIp, ResolutionError, UpdateError,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

pub fn ip(text: &str) -> PublicIp {
    PublicIp::parse(text).expect("valid dotted-quad")
}

/// Tracks how many calls overlap
#[derive(Default)]
struct Concurrency {
    current: AtomicUsize,
    max: AtomicUsize,
}

impl Concurrency {
    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.max.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// An IpResolver returning a configurable address, with optional scripted
/// results and an artificial delay
pub struct ScriptedResolver {
    ip: Mutex<PublicIp>,
    script: Mutex<VecDeque<Result<PublicIp, ResolutionError>>>,
    delay: Duration,
    call_starts: Mutex<Vec<Instant>>,
    concurrency: Concurrency,
}

impl ScriptedResolver {
    pub fn new(address: &str) -> Self {
        Self::with_delay(address, Duration::ZERO)
    }

    pub fn with_delay(address: &str, delay: Duration) -> Self {
        Self {
            ip: Mutex::new(ip(address)),
            script: Mutex::new(VecDeque::new()),
            delay,
            call_starts: Mutex::new(Vec::new()),
            concurrency: Concurrency::default(),
        }
    }

    /// Change the address returned once the script is exhausted
    pub fn set_ip(&self, address: &str) {
        *self.ip.lock().unwrap() = ip(address);
    }

    /// Queue a result consumed before the default address
    pub fn push_result(&self, result: Result<PublicIp, ResolutionError>) {
        self.script.lock().unwrap().push_back(result);
    }

    pub fn call_count(&self) -> usize {
        self.call_starts.lock().unwrap().len()
    }

    pub fn call_starts(&self) -> Vec<Instant> {
        self.call_starts.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.concurrency.max.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IpResolver for ScriptedResolver {
    async fn resolve(&self, _config: &MonitorConfig) -> Result<PublicIp, ResolutionError> {
        self.call_starts.lock().unwrap().push(Instant::now());
        self.concurrency.enter();

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let scripted = self.script.lock().unwrap().pop_front();
        let result = scripted.unwrap_or_else(|| Ok(self.ip.lock().unwrap().clone()));

        self.concurrency.exit();
        result
    }
}

/// A recorded provider call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCall {
    pub provider: ProviderKind,
    pub domain: String,
    pub ip: PublicIp,
}

/// A DnsProvider that records calls and answers from a script
pub struct MockDnsProvider {
    calls: Mutex<Vec<ProviderCall>>,
    script: Mutex<VecDeque<Result<ProviderOutcome, UpdateError>>>,
    delay: Duration,
    concurrency: Concurrency,
}

impl MockDnsProvider {
    pub fn new() -> Self {
        Self::with_delay(Duration::ZERO)
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            script: Mutex::new(VecDeque::new()),
            delay,
            concurrency: Concurrency::default(),
        }
    }

    /// Queue a result; once exhausted the provider answers `good <ip>`
    pub fn push_result(&self, result: Result<ProviderOutcome, UpdateError>) {
        self.script.lock().unwrap().push_back(result);
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.concurrency.max.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DnsProvider for MockDnsProvider {
    async fn update(
        &self,
        provider: ProviderKind,
        domain: &str,
        credentials: &Credentials,
        ip: &PublicIp,
    ) -> Result<ProviderOutcome, UpdateError> {
        // Same fail-fast rule as the real adapter; not recorded as a call
        check_update_parameters(domain, credentials)?;

        self.calls.lock().unwrap().push(ProviderCall {
            provider,
            domain: domain.to_string(),
            ip: ip.clone(),
        });
        self.concurrency.enter();

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let scripted = self.script.lock().unwrap().pop_front();
        self.concurrency.exit();
        scripted.unwrap_or_else(|| Ok(ProviderOutcome::Success(format!("good {}", ip))))
    }
}

/// A clock frozen at a fixed instant
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    pub fn new() -> Self {
        Self(Utc.with_ymd_and_hms(2025, 1, 9, 12, 0, 0).unwrap())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Monitor wired to the given doubles, plus its log sink
pub fn build_monitor(
    resolver: &Arc<ScriptedResolver>,
    provider: &Arc<MockDnsProvider>,
) -> (Monitor, Arc<MemoryLogSink>) {
    let sink = Arc::new(MemoryLogSink::new());
    let monitor = Monitor::with_parts(
        resolver.clone(),
        provider.clone(),
        sink.clone(),
        Arc::new(FixedClock::new()),
    );
    (monitor, sink)
}

/// Minimal valid configuration
pub fn test_config(provider: ProviderKind, interval_secs: u64) -> MonitorConfig {
    MonitorConfig::new(provider, "h.example.com", Credentials::new("u", "p"))
        .with_interval_secs(interval_secs)
}

/// Let spawned tasks run without advancing the paused clock past any timer
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
