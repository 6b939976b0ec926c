//! Transition records.

use crate::builder::TransitionBuilder;
use crate::core::{EventKind, State};
use crate::engine::handler::SharedHandler;
use std::time::Duration;

/// A directed edge `(source, event kind) -> target` with an attached handler.
///
/// Transitions are immutable once built. Cloning shares the handler.
/// The name is descriptive only: uniqueness within a table is decided by
/// the source state and event kind alone.
///
/// A transition with a period is driven by the
/// [`PeriodicEventScheduler`](crate::scheduler::PeriodicEventScheduler);
/// only transitions on [`EventKind::Periodic`] may carry one.
#[derive(Clone, Debug)]
pub struct Transition {
    name: String,
    source: State,
    target: State,
    event_kind: EventKind,
    period: Option<Duration>,
    handler: SharedHandler,
}

impl Transition {
    /// Start building a transition.
    pub fn builder() -> TransitionBuilder {
        TransitionBuilder::new()
    }

    pub(crate) fn from_parts(
        name: String,
        source: State,
        target: State,
        event_kind: EventKind,
        period: Option<Duration>,
        handler: SharedHandler,
    ) -> Self {
        Self {
            name,
            source,
            target,
            event_kind,
            period,
            handler,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &State {
        &self.source
    }

    pub fn target(&self) -> &State {
        &self.target
    }

    pub fn event_kind(&self) -> &EventKind {
        &self.event_kind
    }

    /// Firing period, present only on periodic transitions.
    pub fn period(&self) -> Option<Duration> {
        self.period
    }

    pub fn handler(&self) -> &SharedHandler {
        &self.handler
    }

    /// Check whether this edge leaves `state` on `kind` (pure).
    pub fn matches(&self, state: &State, kind: &EventKind) -> bool {
        self.source == *state && self.event_kind == *kind
    }
}
