//! One repeating timer per periodic transition.

use crate::config::{OverlapPolicy, SchedulerConfig};
use crate::core::Event;
use crate::engine::StateMachine;
use crate::scheduler::sink::{FailureSink, TickError, TickFailure};
use crate::scheduler::TickCounters;
use chrono::Utc;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant};
use tracing::{debug, warn};

/// Whether this timer's previous tick is still firing.
#[derive(Debug, Default)]
struct TickSlot {
    in_flight: bool,
    pending: bool,
}

pub(crate) struct PeriodicTimer {
    transition: String,
    period: Duration,
    config: SchedulerConfig,
    machine: Arc<StateMachine>,
    sink: Arc<dyn FailureSink>,
    counters: Arc<TickCounters>,
    slot: Mutex<TickSlot>,
}

impl PeriodicTimer {
    pub(crate) fn new(
        transition: String,
        period: Duration,
        config: SchedulerConfig,
        machine: Arc<StateMachine>,
        sink: Arc<dyn FailureSink>,
        counters: Arc<TickCounters>,
    ) -> Self {
        Self {
            transition,
            period,
            config,
            machine,
            sink,
            counters,
            slot: Mutex::new(TickSlot::default()),
        }
    }

    /// Tick every period until shutdown is signalled. The first tick comes one
    /// period after the timer is armed.
    pub(crate) async fn run(self: Arc<Self>, mut shutdown_rx: watch::Receiver<bool>) {
        let tick_shutdown = shutdown_rx.clone();
        let Some(first_tick) = Instant::now().checked_add(self.period) else {
            warn!(
                transition = %self.transition,
                period = ?self.period,
                "Periodic timer not armed: period is out of range"
            );
            return;
        };
        let mut ticker = interval_at(first_tick, self.period);
        ticker.set_missed_tick_behavior(self.config.missed_ticks.into());

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.on_tick(&tick_shutdown);
                }
                _ = shutdown_rx.changed() => {
                    debug!(transition = %self.transition, "Periodic timer: shutdown requested");
                    break;
                }
            }
        }
    }

    fn lock_slot(&self) -> MutexGuard<'_, TickSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn on_tick(self: &Arc<Self>, shutdown: &watch::Receiver<bool>) {
        {
            let mut slot = self.lock_slot();
            if slot.in_flight {
                if self.config.overlap == OverlapPolicy::QueueOne && !slot.pending {
                    slot.pending = true;
                    debug!(transition = %self.transition, "Periodic tick queued behind running one");
                } else {
                    self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        transition = %self.transition,
                        period_ms = self.period.as_millis() as u64,
                        "Periodic tick dropped: previous tick still firing"
                    );
                }
                return;
            }
            slot.in_flight = true;
        }

        let timer = Arc::clone(self);
        let shutdown = shutdown.clone();
        // Handlers may block; keep them off the async workers.
        tokio::task::spawn_blocking(move || timer.drain(&shutdown));
    }

    /// Fire the claimed tick, then any tick queued meanwhile.
    fn drain(&self, shutdown: &watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow() {
                let mut slot = self.lock_slot();
                slot.in_flight = false;
                slot.pending = false;
                return;
            }

            self.fire_once();

            let mut slot = self.lock_slot();
            if !std::mem::take(&mut slot.pending) {
                slot.in_flight = false;
                return;
            }
        }
    }

    /// Fire one periodic event. Never unwinds: handler and sink panics are
    /// caught so the slot is always released.
    fn fire_once(&self) {
        self.counters.delivered.fetch_add(1, Ordering::Relaxed);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.machine.fire(Event::periodic())
        }));
        let error = match outcome {
            Ok(Ok(state)) => {
                debug!(transition = %self.transition, state = %state, "Periodic tick fired");
                return;
            }
            Ok(Err(error)) => TickError::Fire(error),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(
                    transition = %self.transition,
                    panic = %message,
                    "Periodic handler panicked"
                );
                TickError::HandlerPanicked { message }
            }
        };

        self.counters.failures.fetch_add(1, Ordering::Relaxed);
        let failure = TickFailure {
            transition: self.transition.clone(),
            error,
            at: Utc::now(),
        };
        if panic::catch_unwind(AssertUnwindSafe(|| self.sink.report(failure))).is_err() {
            warn!(transition = %self.transition, "Failure sink panicked");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
