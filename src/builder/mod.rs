//! Builder API for ergonomic state machine construction.
//!
//! This module provides fluent builders that validate a machine definition
//! before any event is fired, plus shorthands for common transitions.

pub mod error;
pub mod machine;
pub mod transition;

pub use error::BuildError;
pub use machine::StateMachineBuilder;
pub use transition::TransitionBuilder;

use crate::core::{EventKind, State};
use crate::engine::{SharedHandler, Transition};
use std::time::Duration;

/// Create a transition with a no-op handler.
///
/// # Example
///
/// ```
/// use tickstate::builder::simple_transition;
///
/// let transition = simple_transition("start", "IDLE", "RUNNING", "START");
/// assert_eq!(transition.target().name(), "RUNNING");
/// ```
pub fn simple_transition(
    name: impl Into<String>,
    from: impl Into<State>,
    to: impl Into<State>,
    on: impl Into<EventKind>,
) -> Transition {
    Transition::from_parts(
        name.into(),
        from.into(),
        to.into(),
        on.into(),
        None,
        SharedHandler::default(),
    )
}

/// Create a periodic transition with a no-op handler.
///
/// Fails for a zero period or one longer than [`MAX_PERIOD`].
///
/// [`MAX_PERIOD`]: crate::config::MAX_PERIOD
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use tickstate::builder::periodic_transition;
///
/// let transition =
///     periodic_transition("poll", "WAITING", "WAITING", Duration::from_secs(1)).unwrap();
/// assert!(transition.event_kind().is_periodic());
/// ```
pub fn periodic_transition(
    name: impl Into<String>,
    from: impl Into<State>,
    to: impl Into<State>,
    period: Duration,
) -> Result<Transition, BuildError> {
    TransitionBuilder::new()
        .name(name)
        .from(from)
        .to(to)
        .every(period)
        .build()
}
