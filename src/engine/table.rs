//! Transition lookup by source state and event kind.

use crate::core::{EventKind, State};
use crate::engine::error::DuplicateTransitionError;
use crate::engine::transition::Transition;
use std::collections::{BTreeSet, HashMap};

/// Index of transitions keyed by `(source state, event kind)`.
///
/// At most one transition exists per key. The table is filled while a
/// machine is being defined and read-only afterwards; no reachability
/// checks are made, so unreachable states and edges are accepted.
#[derive(Clone, Debug, Default)]
pub struct TransitionTable {
    transitions: Vec<Transition>,
    index: HashMap<State, HashMap<EventKind, usize>>,
}

impl TransitionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a transition, refusing a second edge for an occupied key.
    pub fn register(&mut self, transition: Transition) -> Result<(), DuplicateTransitionError> {
        let by_kind = self.index.entry(transition.source().clone()).or_default();

        if let Some(&existing) = by_kind.get(transition.event_kind()) {
            return Err(DuplicateTransitionError {
                state: transition.source().clone(),
                event_kind: transition.event_kind().clone(),
                existing: self.transitions[existing].name().to_string(),
                rejected: transition.name().to_string(),
            });
        }

        by_kind.insert(transition.event_kind().clone(), self.transitions.len());
        self.transitions.push(transition);
        Ok(())
    }

    /// Find the transition leaving `state` on `kind`.
    pub fn resolve(&self, state: &State, kind: &EventKind) -> Option<&Transition> {
        let position = *self.index.get(state)?.get(kind)?;
        self.transitions.get(position)
    }

    /// Every transition with a period, in insertion order.
    pub fn periodic_transitions(&self) -> Vec<&Transition> {
        self.transitions
            .iter()
            .filter(|t| t.period().is_some())
            .collect()
    }

    /// Transitions leaving `state`, in insertion order.
    pub fn outgoing<'a>(&'a self, state: &'a State) -> impl Iterator<Item = &'a Transition> + 'a {
        self.transitions.iter().filter(move |t| t.source() == state)
    }

    pub fn has_outgoing(&self, state: &State) -> bool {
        self.index.get(state).is_some_and(|by_kind| !by_kind.is_empty())
    }

    /// Every state referenced as a source or target.
    pub fn states(&self) -> BTreeSet<State> {
        self.transitions
            .iter()
            .flat_map(|t| [t.source().clone(), t.target().clone()])
            .collect()
    }

    /// All transitions in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.transitions.iter()
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}

impl<'a> IntoIterator for &'a TransitionTable {
    type Item = &'a Transition;
    type IntoIter = std::slice::Iter<'a, Transition>;

    fn into_iter(self) -> Self::IntoIter {
        self.transitions.iter()
    }
}
