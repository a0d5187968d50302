//! Reconciliation loop
//!
//! The [`Monitor`] periodically resolves the public IP, compares it with the
//! last known value and pushes changes to exactly one DNS provider.
//!
//! ## Architecture
//!
//! ```text
//!                 ┌──────────────┐
//!   tick/manual ─▶│   Monitor    │── snapshot ──▶ subscribers
//!                 └──────────────┘
//!                        │
//!        ┌───────────────┼────────────────┐
//!        ▼               ▼                ▼
//! ┌─────────────┐ ┌─────────────┐  ┌─────────────┐
//! │ IpResolver  │ │ DnsProvider │  │   LogSink   │
//! │ (resolve)   │ │ (on change) │  │  (append)   │
//! └─────────────┘ └─────────────┘  └─────────────┘
//! ```
//!
//! ## Cycle
//!
//! 1. Acquire the busy gate (a tick arriving while a cycle is in flight is dropped)
//! 2. Snapshot the configuration
//! 3. Resolve the public IP
//! 4. If it differs from the last known IP (or a transient failure is pending), update the provider
//! 5. Append exactly one terminal log entry
//! 6. Schedule the next tick one interval after completion

mod state;

pub use state::{CycleOutcome, MonitorPhase, MonitorState};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

use tokio::sync::{Notify, oneshot, watch};
use tokio::time::Instant;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, error, info, warn};

use crate::config::MonitorConfig;
use crate::error::{Error, Result};
use crate::ip::PublicIp;
use crate::log::MemoryLogSink;
use crate::traits::{Clock, DnsProvider, IpResolver, LogEntry, LogKind, LogSink, SystemClock};

/// Handle to the periodic timer task
struct TimerControl {
    id: u64,
    stop_tx: oneshot::Sender<()>,
    wake: Arc<Notify>,
    deadline: Instant,
}

struct Inner {
    resolver: Arc<dyn IpResolver>,
    provider: Arc<dyn DnsProvider>,
    log_sink: Arc<dyn LogSink>,
    clock: Arc<dyn Clock>,
    config: RwLock<Option<MonitorConfig>>,
    state: watch::Sender<MonitorState>,
    timer: Mutex<Option<TimerControl>>,
    next_timer_id: AtomicU64,
}

/// Dynamic DNS monitor
///
/// Cheap to clone; all clones drive the same loop.
///
/// ## Lifecycle
///
/// 1. Create with [`Monitor::new()`] or [`Monitor::with_parts()`]
/// 2. [`Monitor::start()`] runs a first cycle immediately, then one cycle per interval
/// 3. [`Monitor::stop()`] cancels future ticks; a cycle in flight completes and is logged
///
/// ## Overlap
///
/// At most one cycle runs at a time. The gate is a check-and-set on
/// [`MonitorState::updating`] performed under the state channel's lock.
#[derive(Clone)]
pub struct Monitor {
    inner: Arc<Inner>,
}

impl Monitor {
    /// Create a monitor with an in-memory log sink and the system clock
    pub fn new(resolver: Arc<dyn IpResolver>, provider: Arc<dyn DnsProvider>) -> Self {
        Self::with_parts(
            resolver,
            provider,
            Arc::new(MemoryLogSink::new()),
            Arc::new(SystemClock),
        )
    }

    /// Create a monitor from explicit collaborators
    pub fn with_parts(
        resolver: Arc<dyn IpResolver>,
        provider: Arc<dyn DnsProvider>,
        log_sink: Arc<dyn LogSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (state, _) = watch::channel(MonitorState::default());
        Self {
            inner: Arc::new(Inner {
                resolver,
                provider,
                log_sink,
                clock,
                config: RwLock::new(None),
                state,
                timer: Mutex::new(None),
                next_timer_id: AtomicU64::new(0),
            }),
        }
    }

    /// Start the periodic loop
    ///
    /// The first cycle begins immediately. Must be called from within a Tokio
    /// runtime.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if `config` fails validation
    /// - [`Error::AlreadyRunning`] if the timer is already active
    pub fn start(&self, config: MonitorConfig) -> Result<()> {
        config.validate()?;

        let mut timer = self.inner.lock_timer();
        if timer.is_some() {
            return Err(Error::AlreadyRunning);
        }

        info!(
            provider = %config.provider,
            domain = %config.domain,
            interval_secs = config.interval_secs,
            "Starting IP monitor"
        );
        self.inner.set_config(config);

        let id = self.inner.next_timer_id.fetch_add(1, Ordering::Relaxed);
        let (stop_tx, stop_rx) = oneshot::channel();
        let wake = Arc::new(Notify::new());
        *timer = Some(TimerControl {
            id,
            stop_tx,
            wake: wake.clone(),
            deadline: Instant::now(),
        });

        let now = self.inner.clock.now();
        self.inner.state.send_modify(|s| {
            s.running = true;
            s.next_run = Some(now);
            if !s.updating {
                s.phase = MonitorPhase::Idle;
            }
        });
        drop(timer);

        tokio::spawn(run_timer(Arc::downgrade(&self.inner), id, stop_rx, wake));
        Ok(())
    }

    /// Stop the periodic loop
    ///
    /// Future ticks are cancelled. A cycle already in flight is not aborted:
    /// it completes and logs its outcome. Stopping a stopped monitor is a no-op.
    pub fn stop(&self) {
        let control = self.inner.lock_timer().take();
        let Some(control) = control else {
            return;
        };

        let _ = control.stop_tx.send(());
        self.inner.state.send_modify(|s| {
            s.running = false;
            s.next_run = None;
            if !s.updating {
                s.phase = MonitorPhase::Stopped;
            }
        });
        info!("IP monitor stopped");
    }

    /// Run one cycle now, regardless of the timer
    ///
    /// Resets the schedule when running: the next tick is one interval after
    /// this cycle completes.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(outcome))`: The cycle ran
    /// - `Ok(None)`: Another cycle was in flight; nothing was done
    /// - `Err(Error::Config)`: No configuration has been supplied yet
    pub async fn trigger_manual_check(&self) -> Result<Option<CycleOutcome>> {
        if self.inner.config_snapshot().is_none() {
            return Err(Error::config(
                "No configuration loaded; call start() or reconfigure() first",
            ));
        }
        debug!("Manual check requested");
        Ok(self.inner.run_cycle().await)
    }

    /// Replace the configuration
    ///
    /// Provider, domain and credential changes apply from the next cycle on.
    /// An interval change while running reschedules the pending tick to one
    /// new interval from now.
    pub fn reconfigure(&self, config: MonitorConfig) -> Result<()> {
        config.validate()?;

        let previous_interval = self.inner.config_snapshot().map(|c| c.interval_secs);
        let interval_changed = previous_interval != Some(config.interval_secs);
        let interval = config.interval();
        let interval_secs = config.interval_secs;
        self.inner.set_config(config);

        if interval_changed {
            let mut timer = self.inner.lock_timer();
            if let Some(control) = timer.as_mut() {
                debug!(interval_secs, "Interval changed, rescheduling");
                control.deadline = Instant::now() + interval;
                control.wake.notify_one();

                let next = self.inner.clock.now() + chrono::Duration::seconds(interval_secs as i64);
                self.inner.state.send_modify(|s| s.next_run = Some(next));
            }
        }

        Ok(())
    }

    /// Current state snapshot
    pub fn state(&self) -> MonitorState {
        self.inner.state.borrow().clone()
    }

    /// Stream of state snapshots, starting with the current one
    pub fn subscribe(&self) -> WatchStream<MonitorState> {
        WatchStream::new(self.inner.state.subscribe())
    }

    /// Wait until no cycle is in flight
    pub async fn wait_idle(&self) {
        let mut rx = self.inner.state.subscribe();
        // The sender lives as long as `self`
        let _ = rx.wait_for(|s| !s.updating).await;
    }

    /// Current configuration, if any
    pub fn config(&self) -> Option<MonitorConfig> {
        self.inner.config_snapshot()
    }

    /// Up to `limit` most recent log entries, newest first
    pub async fn recent_logs(&self, limit: usize) -> Result<Vec<LogEntry>> {
        self.inner.log_sink.recent(limit).await
    }

    /// Drop the log history
    pub async fn clear_logs(&self) -> Result<()> {
        self.inner.log_sink.clear().await
    }
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor").field("state", &self.state()).finish()
    }
}

/// Releases the busy gate when a cycle ends, including on panic
struct CycleGuard<'a> {
    inner: &'a Inner,
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.inner.state.send_modify(|s| {
            s.updating = false;
            s.phase = if s.running {
                MonitorPhase::Idle
            } else {
                MonitorPhase::Stopped
            };
        });
    }
}

impl Inner {
    fn lock_timer(&self) -> std::sync::MutexGuard<'_, Option<TimerControl>> {
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn config_snapshot(&self) -> Option<MonitorConfig> {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_config(&self, config: MonitorConfig) {
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = Some(config);
    }

    fn deadline_for(&self, id: u64) -> Option<Instant> {
        match self.lock_timer().as_ref() {
            Some(control) if control.id == id => Some(control.deadline),
            _ => None,
        }
    }

    fn try_begin(&self) -> Option<CycleGuard<'_>> {
        let acquired = self.state.send_if_modified(|s| {
            if s.updating {
                return false;
            }
            s.updating = true;
            s.phase = MonitorPhase::Checking;
            true
        });
        acquired.then(|| CycleGuard { inner: self })
    }

    async fn run_cycle(&self) -> Option<CycleOutcome> {
        let Some(guard) = self.try_begin() else {
            debug!("Cycle already in flight, skipping");
            return None;
        };
        let config = self.config_snapshot()?;

        debug!(domain = %config.domain, "Fetching public IP");
        let outcome = match self.resolver.resolve(&config).await {
            Ok(ip) => self.reconcile(&config, ip).await,
            Err(e) => {
                warn!("{}", e);
                self.append(LogKind::Error, "Unable to fetch public IP".to_string(), None)
                    .await;
                CycleOutcome::ResolutionFailed { error: e }
            }
        };

        self.reschedule();
        drop(guard);
        Some(outcome)
    }

    async fn reconcile(&self, config: &MonitorConfig, ip: PublicIp) -> CycleOutcome {
        let (previous, retry_pending) = {
            let s = self.state.borrow();
            (s.last_known_ip.clone(), s.retry_pending)
        };

        let same = previous.as_ref() == Some(&ip);
        if same && !retry_pending {
            self.append(LogKind::Info, "IP has not changed".to_string(), Some(ip.clone()))
                .await;
            return CycleOutcome::Unchanged { ip };
        }

        let message = if same {
            "Retrying DNS update after network failure".to_string()
        } else {
            format!(
                "IP change detected: {} -> {}",
                previous.as_ref().map(PublicIp::as_str).unwrap_or("N/A"),
                ip
            )
        };
        self.append(LogKind::Info, message, Some(ip.clone())).await;

        self.state.send_modify(|s| {
            s.last_known_ip = Some(ip.clone());
            s.phase = MonitorPhase::Updating;
        });

        let label = config.provider.label();
        match self
            .provider
            .update(config.provider, &config.domain, &config.credentials, &ip)
            .await
        {
            Ok(outcome) => {
                let body = outcome.body().trim().to_string();
                let now = self.clock.now();
                self.state.send_modify(|s| {
                    s.last_success = Some(now);
                    s.retry_pending = false;
                });
                self.append(
                    LogKind::Success,
                    format!("DNS updated successfully ({}): {}", label, body),
                    Some(ip.clone()),
                )
                .await;
                CycleOutcome::Updated { ip, previous, body }
            }
            Err(e) => {
                let transient = e.is_transient();
                self.state.send_modify(|s| s.retry_pending = transient);
                self.append(
                    LogKind::Error,
                    format!("DNS update failed {}: {}", label, e),
                    Some(ip.clone()),
                )
                .await;
                CycleOutcome::UpdateFailed { ip, error: e }
            }
        }
    }

    /// Set the next deadline one interval from now and wake the timer task
    fn reschedule(&self) {
        let Some(config) = self.config_snapshot() else {
            return;
        };

        let mut timer = self.lock_timer();
        if let Some(control) = timer.as_mut() {
            control.deadline = Instant::now() + config.interval();
            control.wake.notify_one();

            let next = self.clock.now() + chrono::Duration::seconds(config.interval_secs as i64);
            self.state.send_modify(|s| s.next_run = Some(next));
            debug!(next_run = %next, "Next check scheduled");
        }
    }

    async fn append(&self, kind: LogKind, message: String, ip: Option<PublicIp>) {
        let entry = LogEntry::new(kind, message, ip, self.clock.now());
        if let Err(e) = self.log_sink.append(entry).await {
            error!("Failed to append log entry: {}", e);
        }
    }
}

/// Periodic timer task
///
/// Holds only a weak reference between ticks so dropping every `Monitor`
/// handle ends the task.
async fn run_timer(
    inner: Weak<Inner>,
    id: u64,
    mut stop_rx: oneshot::Receiver<()>,
    wake: Arc<Notify>,
) {
    let mut due = true;
    loop {
        if !matches!(stop_rx.try_recv(), Err(oneshot::error::TryRecvError::Empty)) {
            break;
        }
        let Some(strong) = inner.upgrade() else {
            break;
        };

        let mut skipped = false;
        if due {
            skipped = strong.run_cycle().await.is_none();
        }

        let Some(deadline) = strong.deadline_for(id) else {
            break;
        };
        drop(strong);

        tokio::select! {
            biased;
            _ = &mut stop_rx => break,
            _ = wake.notified() => due = false,
            // A skipped tick waits for the in-flight cycle to reschedule
            _ = tokio::time::sleep_until(deadline), if !skipped => due = true,
        }
    }
    debug!("Timer task exited");
}
