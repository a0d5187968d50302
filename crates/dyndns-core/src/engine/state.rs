//! Observable monitor state and per-cycle outcomes

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{ResolutionError, UpdateError};
use crate::ip::PublicIp;

/// Position of the monitor in its state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorPhase {
    /// Periodic timer inactive, no cycle in flight
    #[default]
    Stopped,
    /// Waiting for the next tick
    Idle,
    /// Resolver in flight
    Checking,
    /// Provider adapter in flight
    Updating,
}

/// Read-only snapshot of the monitor
///
/// `next_run` is set if and only if `running` is true.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct MonitorState {
    /// Periodic timer is active
    pub running: bool,
    /// Last successfully resolved address
    pub last_known_ip: Option<PublicIp>,
    /// Time of the last successful DNS update
    pub last_success: Option<DateTime<Utc>>,
    /// Time the next scheduled cycle is due
    pub next_run: Option<DateTime<Utc>>,
    /// A cycle is in flight
    pub updating: bool,
    /// Current phase
    pub phase: MonitorPhase,
    /// The last update failed transiently and is re-issued next cycle
    pub retry_pending: bool,
}

/// Terminal result of one reconciliation cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Resolved address equals the last known one
    Unchanged {
        /// Resolved address
        ip: PublicIp,
    },
    /// The provider accepted the new address
    Updated {
        /// New address
        ip: PublicIp,
        /// Address known before this cycle
        previous: Option<PublicIp>,
        /// Provider response body
        body: String,
    },
    /// The provider update failed
    UpdateFailed {
        /// Address that was pushed
        ip: PublicIp,
        /// Adapter error
        error: UpdateError,
    },
    /// No endpoint produced an address
    ResolutionFailed {
        /// Resolver error
        error: ResolutionError,
    },
}

impl CycleOutcome {
    /// Whether the cycle ended without an error
    pub fn is_ok(&self) -> bool {
        matches!(self, CycleOutcome::Unchanged { .. } | CycleOutcome::Updated { .. })
    }
}
