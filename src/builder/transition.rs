//! Builder for constructing transitions.

use crate::builder::error::BuildError;
use crate::config::MAX_PERIOD;
use crate::core::{EventKind, State};
use crate::engine::{EventHandler, SharedHandler, Transition};
use std::time::Duration;

/// Builder for constructing transitions with a fluent API.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use tickstate::core::EventKind;
/// use tickstate::engine::Transition;
///
/// let heartbeat = Transition::builder()
///     .name("heartbeat")
///     .from("ALIVE")
///     .to("ALIVE")
///     .every(Duration::from_secs(5))
///     .build()
///     .unwrap();
///
/// assert_eq!(heartbeat.event_kind(), &EventKind::Periodic);
/// assert_eq!(heartbeat.period(), Some(Duration::from_secs(5)));
/// ```
#[derive(Default)]
pub struct TransitionBuilder {
    name: Option<String>,
    source: Option<State>,
    target: Option<State>,
    event_kind: Option<EventKind>,
    period: Option<Duration>,
    handler: Option<SharedHandler>,
}

impl TransitionBuilder {
    /// Create a new transition builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the transition name (required).
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the source state (required).
    pub fn from(mut self, state: impl Into<State>) -> Self {
        self.source = Some(state.into());
        self
    }

    /// Set the target state (required).
    pub fn to(mut self, state: impl Into<State>) -> Self {
        self.target = Some(state.into());
        self
    }

    /// Set the triggering event kind (required unless `every` is used).
    pub fn on(mut self, kind: impl Into<EventKind>) -> Self {
        self.event_kind = Some(kind.into());
        self
    }

    /// Make this a periodic transition fired every `period`.
    pub fn every(mut self, period: Duration) -> Self {
        self.event_kind = Some(EventKind::Periodic);
        self.period = Some(period);
        self
    }

    /// Set the handler (optional, defaults to a no-op).
    pub fn handler<H: EventHandler + 'static>(mut self, handler: H) -> Self {
        self.handler = Some(SharedHandler::new(handler));
        self
    }

    /// Use a handler shared with other transitions.
    pub fn shared_handler(mut self, handler: SharedHandler) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Build the transition.
    pub fn build(self) -> Result<Transition, BuildError> {
        let name = self.name.ok_or(BuildError::MissingName)?;
        let source = self.source.ok_or(BuildError::MissingSourceState)?;
        let target = self.target.ok_or(BuildError::MissingTargetState)?;
        let event_kind = self.event_kind.ok_or(BuildError::MissingEventKind)?;

        if let Some(period) = self.period {
            if period.is_zero() {
                return Err(BuildError::ZeroPeriod { transition: name });
            }
            if period > MAX_PERIOD {
                return Err(BuildError::PeriodTooLong {
                    transition: name,
                    period,
                });
            }
            if !event_kind.is_periodic() {
                return Err(BuildError::PeriodOnNonPeriodicEvent {
                    transition: name,
                    event_kind,
                });
            }
        }

        Ok(Transition::from_parts(
            name,
            source,
            target,
            event_kind,
            self.period,
            self.handler.unwrap_or_default(),
        ))
    }
}
