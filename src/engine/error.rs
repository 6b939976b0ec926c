//! Errors raised while building a transition table or firing events.

use crate::core::{EventKind, State};
use crate::engine::handler::HandlerError;
use thiserror::Error;

/// A second transition was registered for an occupied (state, event kind) key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "Transition '{rejected}' conflicts with '{existing}': both leave state '{state}' on event '{event_kind}'"
)]
pub struct DuplicateTransitionError {
    pub state: State,
    pub event_kind: EventKind,
    /// Name of the transition already in the table
    pub existing: String,
    /// Name of the transition that was refused
    pub rejected: String,
}

/// Errors returned by [`StateMachine::fire`](crate::engine::StateMachine::fire).
///
/// In both cases the machine's current state is left unchanged.
#[derive(Debug, Error)]
pub enum FireError {
    #[error("No transition from state '{state}' on event '{event_kind}'")]
    NoTransitionForEvent { state: State, event_kind: EventKind },

    #[error("Handler of transition '{transition}' failed in state '{state}' on event '{event_kind}': {source}")]
    HandlerExecution {
        transition: String,
        state: State,
        event_kind: EventKind,
        #[source]
        source: HandlerError,
    },
}

impl FireError {
    /// State the machine was in when the event was rejected.
    pub fn state(&self) -> &State {
        match self {
            Self::NoTransitionForEvent { state, .. } | Self::HandlerExecution { state, .. } => state,
        }
    }

    pub fn event_kind(&self) -> &EventKind {
        match self {
            Self::NoTransitionForEvent { event_kind, .. }
            | Self::HandlerExecution { event_kind, .. } => event_kind,
        }
    }
}
