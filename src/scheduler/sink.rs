//! Where failed periodic ticks are reported.

use crate::engine::FireError;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::warn;

/// Why a periodic tick failed.
#[derive(Debug, Error)]
pub enum TickError {
    #[error(transparent)]
    Fire(#[from] FireError),

    /// The handler panicked. The machine's state is unchanged.
    #[error("Handler panicked: {message}")]
    HandlerPanicked { message: String },
}

/// A periodic tick whose `fire` call failed.
#[derive(Debug)]
pub struct TickFailure {
    /// Name of the periodic transition whose timer produced the tick
    pub transition: String,
    pub error: TickError,
    pub at: DateTime<Utc>,
}

/// Receives failures of timer-driven firings.
///
/// Reporting never affects the timer: the next tick is delivered regardless.
/// Called from Tokio's blocking pool, so implementations may block briefly.
pub trait FailureSink: Send + Sync {
    fn report(&self, failure: TickFailure);
}

impl<F> FailureSink for F
where
    F: Fn(TickFailure) + Send + Sync,
{
    fn report(&self, failure: TickFailure) {
        self(failure)
    }
}

/// Default sink: logs each failure at `WARN`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFailureSink;

impl FailureSink for LogFailureSink {
    fn report(&self, failure: TickFailure) {
        warn!(
            transition = %failure.transition,
            at = %failure.at,
            error = %failure.error,
            "Periodic tick failed"
        );
    }
}
