//! Builder for constructing validated state machines.

use crate::builder::error::BuildError;
use crate::builder::transition::TransitionBuilder;
use crate::config::MachineConfig;
use crate::core::State;
use crate::engine::{StateMachine, Transition, TransitionTable};
use std::collections::BTreeSet;

/// Builder for constructing state machines with a fluent API.
///
/// Unlike [`StateMachine::new`], the builder checks the definition against
/// the declared state set: the initial state, every final state and both
/// ends of every transition must be declared.
///
/// # Example
///
/// ```rust
/// use tickstate::builder::StateMachineBuilder;
/// use tickstate::core::{Event, State};
/// use tickstate::engine::Transition;
///
/// let machine = StateMachineBuilder::new(["IDLE", "RUNNING", "DONE"], "IDLE")
///     .final_state("DONE")
///     .transition(
///         Transition::builder().name("start").from("IDLE").to("RUNNING").on("START"),
///     )
///     .unwrap()
///     .transition(
///         Transition::builder().name("finish").from("RUNNING").to("DONE").on("FINISH"),
///     )
///     .unwrap()
///     .build()
///     .unwrap();
///
/// machine.fire(Event::new("START")).unwrap();
/// machine.fire(Event::new("FINISH")).unwrap();
/// assert!(machine.is_final());
/// ```
pub struct StateMachineBuilder {
    states: BTreeSet<State>,
    initial: State,
    final_states: BTreeSet<State>,
    transitions: Vec<Transition>,
    config: MachineConfig,
}

impl StateMachineBuilder {
    /// Create a builder for a machine over `states` starting in `initial`.
    pub fn new<I, S>(states: I, initial: impl Into<State>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<State>,
    {
        Self {
            states: states.into_iter().map(Into::into).collect(),
            initial: initial.into(),
            final_states: BTreeSet::new(),
            transitions: Vec::new(),
            config: MachineConfig::default(),
        }
    }

    /// Mark a state as final.
    pub fn final_state(mut self, state: impl Into<State>) -> Self {
        self.final_states.insert(state.into());
        self
    }

    /// Mark several states as final.
    pub fn final_states<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<State>,
    {
        self.final_states.extend(states.into_iter().map(Into::into));
        self
    }

    /// Add a transition using a builder.
    /// Returns an error if the builder fails validation.
    pub fn transition(mut self, builder: TransitionBuilder) -> Result<Self, BuildError> {
        self.transitions.push(builder.build()?);
        Ok(self)
    }

    /// Add a pre-built transition.
    pub fn register(mut self, transition: Transition) -> Self {
        self.transitions.push(transition);
        self
    }

    /// Add multiple transitions at once.
    pub fn transitions(mut self, transitions: impl IntoIterator<Item = Transition>) -> Self {
        self.transitions.extend(transitions);
        self
    }

    pub fn config(mut self, config: MachineConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate the definition and build the machine.
    pub fn build(self) -> Result<StateMachine, BuildError> {
        if self.states.is_empty() {
            return Err(BuildError::NoStates);
        }
        if !self.states.contains(&self.initial) {
            return Err(BuildError::UnknownInitialState(self.initial));
        }
        if let Some(unknown) = self.final_states.difference(&self.states).next() {
            return Err(BuildError::UnknownFinalState(unknown.clone()));
        }

        let mut table = TransitionTable::new();
        for transition in self.transitions {
            for state in [transition.source(), transition.target()] {
                if !self.states.contains(state) {
                    return Err(BuildError::UnknownState {
                        transition: transition.name().to_string(),
                        state: state.clone(),
                    });
                }
            }
            table.register(transition)?;
        }

        Ok(StateMachine::with_config(self.initial, table, self.config)
            .declare(self.states, self.final_states))
    }
}
