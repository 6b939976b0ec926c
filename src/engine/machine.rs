//! State machine that fires events against a transition table.

use crate::config::MachineConfig;
use crate::core::{Event, State, StateHistory, StateTransition};
use crate::engine::error::FireError;
use crate::engine::table::TransitionTable;
use chrono::Utc;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tracing::{debug, warn};
use uuid::Uuid;

/// Mutable part of the machine, guarded by the firing lock.
struct Firing {
    current: State,
    last_event: Option<Event>,
    history: StateHistory,
}

/// A finite state machine driven by [`fire`](StateMachine::fire).
///
/// The transition table is fixed at construction. The current state is the
/// only mutable part and changes exclusively through `fire`, which runs the
/// whole resolve, handle, move sequence under one lock. Concurrent callers
/// (including the periodic scheduler) are therefore serialized per machine.
///
/// # Example
///
/// ```rust
/// use tickstate::core::{Event, State};
/// use tickstate::engine::{FireError, StateMachine, Transition, TransitionTable};
///
/// let idle = State::new("IDLE");
/// let running = State::new("RUNNING");
///
/// let mut table = TransitionTable::new();
/// table.register(
///     Transition::builder()
///         .name("start")
///         .from(&idle)
///         .to(&running)
///         .on("START")
///         .build()
///         .unwrap(),
/// ).unwrap();
///
/// let machine = StateMachine::new(idle, table);
/// assert_eq!(machine.fire(Event::new("START")).unwrap(), running);
///
/// let err = machine.fire(Event::new("START")).unwrap_err();
/// assert!(matches!(err, FireError::NoTransitionForEvent { .. }));
/// assert_eq!(machine.current_state(), running);
/// ```
pub struct StateMachine {
    id: Uuid,
    initial: State,
    states: BTreeSet<State>,
    final_states: BTreeSet<State>,
    table: TransitionTable,
    firing: Mutex<Firing>,
    notifier: broadcast::Sender<StateTransition>,
}

impl StateMachine {
    /// Create a machine in `initial` with the default configuration.
    pub fn new(initial: State, table: TransitionTable) -> Self {
        Self::with_config(initial, table, MachineConfig::default())
    }

    /// Create a machine in `initial` with an explicit configuration.
    pub fn with_config(initial: State, table: TransitionTable, config: MachineConfig) -> Self {
        let mut states = table.states();
        states.insert(initial.clone());

        let (notifier, _) = broadcast::channel(config.notification_capacity.max(1));

        Self {
            id: Uuid::new_v4(),
            firing: Mutex::new(Firing {
                current: initial.clone(),
                last_event: None,
                history: StateHistory::with_limit(config.history_limit),
            }),
            initial,
            states,
            final_states: BTreeSet::new(),
            table,
            notifier,
        }
    }

    /// Declare extra states and final states. Used by the builder after
    /// validation.
    pub(crate) fn declare(
        mut self,
        states: impl IntoIterator<Item = State>,
        final_states: BTreeSet<State>,
    ) -> Self {
        self.states.extend(states);
        self.final_states = final_states;
        self
    }

    fn lock(&self) -> MutexGuard<'_, Firing> {
        // The state is written only after a handler returns, so a handler
        // that panicked left it intact.
        self.firing.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fire an event.
    ///
    /// Resolves the transition leaving the current state on the event's kind,
    /// runs its handler and, if the handler succeeds, moves to the target
    /// state and returns it. On any error the current state is unchanged.
    ///
    /// Blocks while another `fire` on this machine is in progress. Calling
    /// `fire` from inside a handler of the same machine deadlocks.
    pub fn fire(&self, event: Event) -> Result<State, FireError> {
        let mut firing = self.lock();

        let Some(transition) = self.table.resolve(&firing.current, event.kind()) else {
            debug!(
                machine = %self.id,
                state = %firing.current,
                event_kind = %event.kind(),
                event_id = %event.id(),
                "No transition for event"
            );
            return Err(FireError::NoTransitionForEvent {
                state: firing.current.clone(),
                event_kind: event.kind().clone(),
            });
        };

        if let Err(source) = transition.handler().handle(&event) {
            warn!(
                machine = %self.id,
                transition = transition.name(),
                state = %firing.current,
                event_kind = %event.kind(),
                event_id = %event.id(),
                error = %source,
                "Transition handler failed"
            );
            return Err(FireError::HandlerExecution {
                transition: transition.name().to_string(),
                state: firing.current.clone(),
                event_kind: event.kind().clone(),
                source,
            });
        }

        let record = StateTransition {
            transition: transition.name().to_string(),
            from: std::mem::replace(&mut firing.current, transition.target().clone()),
            to: transition.target().clone(),
            event_kind: event.kind().clone(),
            event_id: event.id(),
            timestamp: Utc::now(),
        };

        debug!(
            machine = %self.id,
            transition = %record.transition,
            from = %record.from,
            to = %record.to,
            event_kind = %record.event_kind,
            "Transition fired"
        );

        firing.history.record(record.clone());
        firing.last_event = Some(event);
        // Sent under the lock so subscribers see transitions in firing order.
        // An error only means nobody is subscribed.
        let _ = self.notifier.send(record);

        Ok(firing.current.clone())
    }

    /// Get the current state.
    pub fn current_state(&self) -> State {
        self.lock().current.clone()
    }

    pub fn initial_state(&self) -> &State {
        &self.initial
    }

    /// Every declared state, including those only referenced by transitions.
    pub fn states(&self) -> &BTreeSet<State> {
        &self.states
    }

    pub fn final_states(&self) -> &BTreeSet<State> {
        &self.final_states
    }

    /// Check whether the current state was declared final.
    ///
    /// Final states are informational: `fire` treats them like any other
    /// state.
    pub fn is_final(&self) -> bool {
        let firing = self.lock();
        self.final_states.contains(&firing.current)
    }

    /// Check whether the current state has no outgoing transitions, in which
    /// case every `fire` fails.
    pub fn is_terminal(&self) -> bool {
        let firing = self.lock();
        !self.table.has_outgoing(&firing.current)
    }

    /// The last event that completed a transition.
    pub fn last_event(&self) -> Option<Event> {
        self.lock().last_event.clone()
    }

    /// Snapshot of the retained transition history.
    pub fn history(&self) -> StateHistory {
        self.lock().history.clone()
    }

    pub fn transitions(&self) -> &TransitionTable {
        &self.table
    }

    /// Subscribe to completed transitions.
    ///
    /// Only transitions fired after subscribing are received.
    pub fn subscribe(&self) -> broadcast::Receiver<StateTransition> {
        self.notifier.subscribe()
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl fmt::Debug for StateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // try_lock: formatting from inside a handler must not deadlock.
        let current = self.firing.try_lock().ok().map(|firing| firing.current.clone());
        f.debug_struct("StateMachine")
            .field("id", &self.id)
            .field("initial", &self.initial)
            .field("current", &current)
            .field("transitions", &self.table.len())
            .finish()
    }
}
