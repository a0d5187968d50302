// # Log Sink Trait
//
// Defines the interface for the bounded history of monitor events.
//
// ## Purpose
//
// Every observable outcome of a reconciliation cycle is appended as a
// `LogEntry`. External collaborators (a dashboard, the daemon's exit summary)
// read the history newest-first; they never write to it.
//
// ## Implementations
//
// - In-memory ring: `dyndns_core::log::MemoryLogSink`

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ip::PublicIp;

/// Severity of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    /// Informational (change detected, unchanged)
    Info,
    /// DNS update applied
    Success,
    /// Resolution or update failure
    Error,
}

/// An immutable monitor event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Unique token
    pub id: String,
    /// Creation instant
    pub timestamp: DateTime<Utc>,
    /// Severity
    pub kind: LogKind,
    /// Human-readable message
    pub message: String,
    /// Address associated with the event
    pub ip: Option<PublicIp>,
}

impl LogEntry {
    /// Create a new log entry with a fresh id
    pub fn new(
        kind: LogKind,
        message: impl Into<String>,
        ip: Option<PublicIp>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            timestamp,
            kind,
            message: message.into(),
            ip,
        }
    }
}

/// Trait for log sink implementations
///
/// # Thread Safety
///
/// All methods must be safe to call concurrently from multiple tasks.
///
/// # Invariants
///
/// - At most `capacity` entries are retained, oldest evicted first
/// - Reads return entries newest-first
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Append an entry, evicting the oldest one when full
    async fn append(&self, entry: LogEntry) -> Result<(), crate::Error>;

    /// Up to `limit` most recent entries, newest first
    async fn recent(&self, limit: usize) -> Result<Vec<LogEntry>, crate::Error>;

    /// Drop every entry
    async fn clear(&self) -> Result<(), crate::Error>;
}
