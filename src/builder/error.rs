//! Build errors for state machine and transition builders.

use crate::config::MAX_PERIOD;
use crate::core::{EventKind, State};
use crate::engine::DuplicateTransitionError;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when building state machines and transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("Transition name not specified. Call .name(name)")]
    MissingName,

    #[error("Transition source state not specified. Call .from(state)")]
    MissingSourceState,

    #[error("Transition target state not specified. Call .to(state)")]
    MissingTargetState,

    #[error("Transition event kind not specified. Call .on(kind) or .every(period)")]
    MissingEventKind,

    #[error("Transition '{transition}' has a zero period")]
    ZeroPeriod { transition: String },

    #[error("Transition '{transition}' has a period of {period:?}, longer than {max:?}", max = MAX_PERIOD)]
    PeriodTooLong {
        transition: String,
        period: Duration,
    },

    #[error("Transition '{transition}' has a period but fires on '{event_kind}', not the periodic event")]
    PeriodOnNonPeriodicEvent {
        transition: String,
        event_kind: EventKind,
    },

    #[error("No states declared")]
    NoStates,

    #[error("Initial state '{0}' is not a declared state")]
    UnknownInitialState(State),

    #[error("Final state '{0}' is not a declared state")]
    UnknownFinalState(State),

    #[error("Transition '{transition}' references undeclared state '{state}'")]
    UnknownState { transition: String, state: State },

    #[error(transparent)]
    Duplicate(#[from] DuplicateTransitionError),
}
