//! Timer-driven periodic events.
//!
//! The [`PeriodicEventScheduler`] arms one repeating Tokio timer per periodic
//! transition of a machine. Each tick synthesizes [`Event::periodic`] and
//! fires it on Tokio's blocking pool. Timers are independent of each other
//! and of externally fired events; the machine's firing lock serializes them.
//!
//! Failed ticks, including ticks whose handler panicked, go to a
//! [`FailureSink`] and never stop the timer.
//!
//! [`Event::periodic`]: crate::core::Event::periodic

mod sink;
mod timer;

pub use sink::{FailureSink, LogFailureSink, TickError, TickFailure};

use crate::config::SchedulerConfig;
use crate::engine::StateMachine;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use timer::PeriodicTimer;
use tracing::info;

/// Errors returned by [`PeriodicEventScheduler::start`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("Periodic scheduler must be started inside a Tokio runtime")]
    NoRuntime,

    #[error("Periodic scheduler is already running")]
    AlreadyRunning,
}

#[derive(Debug, Default)]
pub(crate) struct TickCounters {
    delivered: AtomicU64,
    dropped: AtomicU64,
    failures: AtomicU64,
}

/// Tick counters since the scheduler was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SchedulerStats {
    /// Ticks that reached `fire`
    pub ticks_delivered: u64,
    /// Ticks discarded because the previous tick was still firing
    pub ticks_dropped: u64,
    /// Delivered ticks whose `fire` failed
    pub failures: u64,
}

struct Running {
    shutdown_tx: watch::Sender<bool>,
    timers: Vec<JoinHandle<()>>,
}

/// Drives the periodic transitions of a [`StateMachine`].
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::time::Duration;
/// use tickstate::builder::{periodic_transition, StateMachineBuilder};
/// use tickstate::config::SchedulerConfig;
/// use tickstate::core::State;
/// use tickstate::scheduler::PeriodicEventScheduler;
///
/// # #[tokio::main]
/// # async fn main() {
/// let machine = Arc::new(
///     StateMachineBuilder::new(["WAITING", "EXPIRED"], "WAITING")
///         .register(
///             periodic_transition("expire", "WAITING", "EXPIRED", Duration::from_millis(20))
///                 .unwrap(),
///         )
///         .build()
///         .unwrap(),
/// );
///
/// let scheduler = PeriodicEventScheduler::new(SchedulerConfig::default());
/// scheduler.start(Arc::clone(&machine)).unwrap();
/// tokio::time::sleep(Duration::from_millis(100)).await;
/// scheduler.stop();
///
/// assert_eq!(machine.current_state(), State::new("EXPIRED"));
/// # }
/// ```
pub struct PeriodicEventScheduler {
    config: SchedulerConfig,
    sink: Arc<dyn FailureSink>,
    counters: Arc<TickCounters>,
    running: Mutex<Option<Running>>,
}

impl PeriodicEventScheduler {
    /// Create a scheduler that logs tick failures.
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            sink: Arc::new(LogFailureSink),
            counters: Arc::new(TickCounters::default()),
            running: Mutex::new(None),
        }
    }

    /// Report tick failures to `sink` instead of the log.
    pub fn with_failure_sink(mut self, sink: impl FailureSink + 'static) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    fn lock_running(&self) -> MutexGuard<'_, Option<Running>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Arm one timer per periodic transition of `machine`.
    ///
    /// Transitions on the periodic kind without a period are not scheduled.
    pub fn start(&self, machine: Arc<StateMachine>) -> Result<(), SchedulerError> {
        let runtime = Handle::try_current().map_err(|_| SchedulerError::NoRuntime)?;

        let mut running = self.lock_running();
        if running.is_some() {
            return Err(SchedulerError::AlreadyRunning);
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let timers: Vec<JoinHandle<()>> = machine
            .transitions()
            .periodic_transitions()
            .into_iter()
            .filter_map(|transition| {
                let period = transition.period()?;
                let timer = Arc::new(PeriodicTimer::new(
                    transition.name().to_string(),
                    period,
                    self.config,
                    Arc::clone(&machine),
                    Arc::clone(&self.sink),
                    Arc::clone(&self.counters),
                ));
                Some(runtime.spawn(timer.run(shutdown_rx.clone())))
            })
            .collect();

        info!(
            machine = %machine.id(),
            timers = timers.len(),
            overlap = ?self.config.overlap,
            "Periodic scheduler started"
        );

        *running = Some(Running {
            shutdown_tx,
            timers,
        });
        Ok(())
    }

    /// Cancel every timer.
    ///
    /// Ticks already firing run to completion; no tick starts firing after
    /// this returns. Never waits for a handler, so it is safe to call from
    /// any thread, including from inside a handler. Calling it again is a
    /// no-op.
    pub fn stop(&self) {
        let Some(running) = self.lock_running().take() else {
            return;
        };

        // Seen by blocking workers before each fire, and wakes the timer loops.
        let _ = running.shutdown_tx.send(true);
        for timer in &running.timers {
            timer.abort();
        }

        info!(timers = running.timers.len(), "Periodic scheduler stopped");
    }

    pub fn is_running(&self) -> bool {
        self.lock_running().is_some()
    }

    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            ticks_delivered: self.counters.delivered.load(Ordering::Relaxed),
            ticks_dropped: self.counters.dropped.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }
}

impl Default for PeriodicEventScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl Drop for PeriodicEventScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
