// # Clock Trait
//
// Wall-clock abstraction used for log timestamps and the exposed
// `next_run` / `last_success` instants. Scheduling itself runs on the tokio
// timer so paused-time tests stay deterministic.

use chrono::{DateTime, Utc};

/// Source of the current wall-clock time
pub trait Clock: Send + Sync {
    /// The current instant
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
