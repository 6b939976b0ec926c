//! State transition history tracking.
//!
//! Every successful firing produces a [`StateTransition`] record. The machine
//! keeps the most recent records in a bounded [`StateHistory`] and broadcasts
//! each one to subscribers.

use super::event::EventKind;
use super::state::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;
use uuid::Uuid;

/// Record of a single successful transition.
///
/// # Example
///
/// ```rust
/// use tickstate::core::{EventKind, State, StateTransition};
/// use chrono::Utc;
/// use uuid::Uuid;
///
/// let record = StateTransition {
///     transition: "start".to_string(),
///     from: State::new("IDLE"),
///     to: State::new("RUNNING"),
///     event_kind: EventKind::named("START"),
///     event_id: Uuid::new_v4(),
///     timestamp: Utc::now(),
/// };
/// assert_eq!(record.to.name(), "RUNNING");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateTransition {
    /// Name of the transition that fired
    pub transition: String,
    /// The state being transitioned from
    pub from: State,
    /// The state being transitioned to
    pub to: State,
    /// Kind of the event that triggered the transition
    pub event_kind: EventKind,
    /// Id of the event that triggered the transition
    pub event_id: Uuid,
    /// When the transition completed
    pub timestamp: DateTime<Utc>,
}

/// Ordered, bounded history of state transitions.
///
/// Once `limit` records are held, recording a new one evicts the oldest.
/// A limit of zero disables recording.
///
/// # Example
///
/// ```rust
/// use tickstate::core::{EventKind, State, StateHistory, StateTransition};
/// use chrono::Utc;
/// use uuid::Uuid;
///
/// let step = |from: &str, to: &str| StateTransition {
///     transition: format!("{from}->{to}"),
///     from: State::new(from),
///     to: State::new(to),
///     event_kind: EventKind::named("NEXT"),
///     event_id: Uuid::new_v4(),
///     timestamp: Utc::now(),
/// };
///
/// let mut history = StateHistory::with_limit(8);
/// history.record(step("A", "B"));
/// history.record(step("B", "C"));
///
/// let path = history.get_path();
/// assert_eq!(path.len(), 3); // A -> B -> C
/// assert_eq!(path[0].name(), "A");
/// assert_eq!(path[2].name(), "C");
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StateHistory {
    limit: usize,
    transitions: VecDeque<StateTransition>,
}

impl Default for StateHistory {
    fn default() -> Self {
        Self::with_limit(crate::config::DEFAULT_HISTORY_LIMIT)
    }
}

impl StateHistory {
    /// Create an empty history holding at most `limit` records.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            transitions: VecDeque::with_capacity(limit.min(64)),
        }
    }

    /// Record a transition, evicting the oldest one when full.
    pub fn record(&mut self, transition: StateTransition) {
        if self.limit == 0 {
            return;
        }
        while self.transitions.len() >= self.limit {
            self.transitions.pop_front();
        }
        self.transitions.push_back(transition);
    }

    /// Get the path of states traversed by the retained records.
    ///
    /// Returns the `from` state of the oldest record, then the `to` state of
    /// each record in order.
    pub fn get_path(&self) -> Vec<&State> {
        let mut path = Vec::with_capacity(self.transitions.len() + 1);
        if let Some(first) = self.transitions.front() {
            path.push(&first.from);
        }
        for transition in &self.transitions {
            path.push(&transition.to);
        }
        path
    }

    /// Calculate the duration from the oldest to the newest record.
    ///
    /// Returns `None` if there are no records.
    pub fn duration(&self) -> Option<Duration> {
        let (first, last) = (self.transitions.front()?, self.transitions.back()?);
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }

    /// Iterate over retained records, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &StateTransition> {
        self.transitions.iter()
    }

    pub fn last(&self) -> Option<&StateTransition> {
        self.transitions.back()
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}
