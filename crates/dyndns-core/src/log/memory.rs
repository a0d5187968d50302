// # Memory Log Sink
//
// Bounded in-memory ring of monitor events.
//
// ## Behavior
//
// - Holds at most `capacity` entries (100 by default)
// - Appending to a full ring evicts the oldest entry
// - Reads are newest-first
// - Every appended entry is mirrored to `tracing` at a level matching its kind
//
// History is lost on restart.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::config::DEFAULT_LOG_CAPACITY;
use crate::traits::log_sink::{LogEntry, LogKind, LogSink};

/// In-memory log sink
///
/// # Example
///
/// ```rust,no_run
/// use dyndns_core::log::MemoryLogSink;
/// use dyndns_core::{LogEntry, LogKind, LogSink};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let sink = MemoryLogSink::new();
///
///     sink.append(LogEntry::new(LogKind::Info, "IP has not changed", None, chrono::Utc::now()))
///         .await?;
///
///     let latest = sink.recent(10).await?;
///     assert_eq!(latest.len(), 1);
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryLogSink {
    entries: Arc<RwLock<VecDeque<LogEntry>>>,
    capacity: usize,
}

impl MemoryLogSink {
    /// Create a sink holding the default number of entries
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }

    /// Create a sink holding at most `capacity` entries
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Maximum number of retained entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries currently held
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Check if the sink is empty
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for MemoryLogSink {
    fn default() -> Self {
        Self::new()
    }
}

fn mirror(entry: &LogEntry) {
    let ip = entry.ip.as_ref().map(|ip| ip.as_str()).unwrap_or("-");
    match entry.kind {
        LogKind::Info => tracing::info!(ip, "{}", entry.message),
        LogKind::Success => tracing::info!(ip, outcome = "success", "{}", entry.message),
        LogKind::Error => tracing::error!(ip, "{}", entry.message),
    }
}

#[async_trait]
impl LogSink for MemoryLogSink {
    async fn append(&self, entry: LogEntry) -> Result<(), Error> {
        mirror(&entry);

        let mut guard = self.entries.write().await;
        // Newest at the front
        guard.push_front(entry);
        guard.truncate(self.capacity);
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<LogEntry>, Error> {
        let guard = self.entries.read().await;
        Ok(guard.iter().take(limit).cloned().collect())
    }

    async fn clear(&self) -> Result<(), Error> {
        self.entries.write().await.clear();
        Ok(())
    }
}
