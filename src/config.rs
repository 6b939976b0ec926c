//! Runtime configuration for machines and the periodic scheduler.
//!
//! Both config types deserialize with defaults for missing fields, so a
//! partial JSON document is a valid configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Default number of transitions kept in a machine's history.
pub const DEFAULT_HISTORY_LIMIT: usize = 256;

/// Default capacity of the state change broadcast channel.
pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 64;

/// Longest period a periodic transition may have (one year).
pub const MAX_PERIOD: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Machine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Maximum number of transitions retained in history (0 disables it)
    pub history_limit: usize,

    /// Buffered notifications per subscriber before the slowest one lags
    pub notification_capacity: usize,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            notification_capacity: DEFAULT_NOTIFICATION_CAPACITY,
        }
    }
}

impl MachineConfig {
    /// Set history limit
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Set notification capacity (values below 1 are treated as 1)
    pub fn with_notification_capacity(mut self, capacity: usize) -> Self {
        self.notification_capacity = capacity;
        self
    }
}

/// What a timer does with a tick that arrives while its previous tick is
/// still firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// Drop the overlapping tick and log it.
    #[default]
    Drop,
    /// Remember one overlapping tick and fire it once the running one
    /// completes. Further overlapping ticks are dropped.
    QueueOne,
}

/// How a timer catches up after the runtime was too busy to tick on time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissedTicks {
    /// Fire missed ticks back to back until caught up.
    Burst,
    /// Restart the period from the late tick.
    Delay,
    /// Skip missed ticks and resume on the original schedule.
    #[default]
    Skip,
}

impl From<MissedTicks> for MissedTickBehavior {
    fn from(missed: MissedTicks) -> Self {
        match missed {
            MissedTicks::Burst => MissedTickBehavior::Burst,
            MissedTicks::Delay => MissedTickBehavior::Delay,
            MissedTicks::Skip => MissedTickBehavior::Skip,
        }
    }
}

/// Periodic scheduler configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Policy for ticks that overlap a running fire
    pub overlap: OverlapPolicy,

    /// Catch-up behavior for late timers
    pub missed_ticks: MissedTicks,
}

impl SchedulerConfig {
    /// Set overlap policy
    pub fn with_overlap(mut self, overlap: OverlapPolicy) -> Self {
        self.overlap = overlap;
        self
    }

    /// Set missed tick behavior
    pub fn with_missed_ticks(mut self, missed_ticks: MissedTicks) -> Self {
        self.missed_ticks = missed_ticks;
        self
    }
}
