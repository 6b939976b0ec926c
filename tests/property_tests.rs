//! Property-based tests for the transition table and firing protocol.
//!
//! These tests use proptest to compare the machine against a plain map model
//! over many randomly generated tables and event sequences.

use proptest::prelude::*;
use std::collections::HashMap;
use tickstate::core::{Event, EventKind, State};
use tickstate::engine::{FireError, HandlerError, StateMachine, Transition, TransitionTable};

const STATES: [&str; 4] = ["S0", "S1", "S2", "S3"];
const KINDS: [&str; 3] = ["K0", "K1", "K2"];

/// (source, kind, target, handler fails)
type Edge = (usize, usize, usize, bool);

fn edge_strategy() -> impl Strategy<Value = Edge> {
    (0..STATES.len(), 0..KINDS.len(), 0..STATES.len(), any::<bool>())
}

fn transition(name: String, (from, kind, to, fails): Edge) -> Transition {
    Transition::builder()
        .name(name)
        .from(STATES[from])
        .to(STATES[to])
        .on(KINDS[kind])
        .handler(move |_: &Event| -> Result<(), HandlerError> {
            if fails {
                Err("rejected".into())
            } else {
                Ok(())
            }
        })
        .build()
        .unwrap()
}

/// Build a table, keeping the first edge for each key like the table does.
fn build(edges: &[Edge]) -> (TransitionTable, HashMap<(usize, usize), (usize, bool)>) {
    let mut table = TransitionTable::new();
    let mut model = HashMap::new();

    for (i, edge) in edges.iter().enumerate() {
        let (from, kind, to, fails) = *edge;
        let registered = table.register(transition(format!("t{i}"), *edge));
        let occupied = model.contains_key(&(from, kind));
        assert_eq!(registered.is_err(), occupied, "table disagrees with model");
        if !occupied {
            model.insert((from, kind), (to, fails));
        }
    }

    (table, model)
}

proptest! {
    #[test]
    fn duplicate_key_is_always_rejected(
        from in 0..STATES.len(),
        kind in 0..KINDS.len(),
        first_to in 0..STATES.len(),
        second_to in 0..STATES.len(),
    ) {
        let mut table = TransitionTable::new();
        table.register(transition("first".into(), (from, kind, first_to, false))).unwrap();

        let err = table
            .register(transition("second".into(), (from, kind, second_to, false)))
            .unwrap_err();

        prop_assert_eq!(err.state, State::new(STATES[from]));
        prop_assert_eq!(err.event_kind, EventKind::named(KINDS[kind]));
        prop_assert_eq!(table.len(), 1);
    }

    #[test]
    fn distinct_keys_are_always_accepted(
        from in 0..STATES.len(),
        kind in 0..KINDS.len(),
        to in 0..STATES.len(),
    ) {
        let mut table = TransitionTable::new();
        table.register(transition("base".into(), (from, kind, to, false))).unwrap();

        let other_state = (from + 1) % STATES.len();
        let other_kind = (kind + 1) % KINDS.len();

        prop_assert!(table.register(transition("s".into(), (other_state, kind, to, false))).is_ok());
        prop_assert!(table.register(transition("k".into(), (from, other_kind, to, false))).is_ok());
        prop_assert_eq!(table.len(), 3);
    }

    #[test]
    fn fire_matches_model(
        edges in prop::collection::vec(edge_strategy(), 0..12),
        events in prop::collection::vec(0..KINDS.len(), 0..24),
    ) {
        let (table, model) = build(&edges);
        let machine = StateMachine::new(State::new(STATES[0]), table);
        let mut current = 0usize;

        for kind in events {
            let before = machine.current_state();
            let result = machine.fire(Event::new(KINDS[kind]));

            match model.get(&(current, kind)) {
                None => {
                    let is_no_transition = matches!(
                        result,
                        Err(FireError::NoTransitionForEvent { .. })
                    );
                    prop_assert!(is_no_transition);
                    prop_assert_eq!(machine.current_state(), before);
                }
                Some((_, true)) => {
                    let is_handler_error = matches!(
                        result,
                        Err(FireError::HandlerExecution { .. })
                    );
                    prop_assert!(is_handler_error);
                    prop_assert_eq!(machine.current_state(), before);
                }
                Some((to, false)) => {
                    prop_assert_eq!(result.unwrap(), State::new(STATES[*to]));
                    current = *to;
                }
            }

            prop_assert_eq!(machine.current_state(), State::new(STATES[current]));
        }
    }

    #[test]
    fn fire_is_deterministic(
        from in 0..STATES.len(),
        kind in 0..KINDS.len(),
        to in 0..STATES.len(),
        repeats in 1..8usize,
    ) {
        for _ in 0..repeats {
            let mut table = TransitionTable::new();
            table.register(transition("edge".into(), (from, kind, to, false))).unwrap();
            let machine = StateMachine::new(State::new(STATES[from]), table);

            prop_assert_eq!(
                machine.fire(Event::new(KINDS[kind])).unwrap(),
                State::new(STATES[to])
            );
        }
    }

    #[test]
    fn unmatched_event_never_mutates(
        start in 0..STATES.len(),
        attempts in 1..16usize,
    ) {
        let mut table = TransitionTable::new();
        table.register(transition("only".into(), ((start + 1) % STATES.len(), 0, start, false))).unwrap();
        let machine = StateMachine::new(State::new(STATES[start]), table);

        for _ in 0..attempts {
            prop_assert!(machine.fire(Event::new(KINDS[0])).is_err());
            prop_assert_eq!(machine.current_state(), State::new(STATES[start]));
        }
        prop_assert!(machine.history().is_empty());
    }

    #[test]
    fn state_roundtrip_serialization(index in 0..STATES.len()) {
        let state = State::new(STATES[index]);
        let json = serde_json::to_string(&state).unwrap();
        let deserialized: State = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(state, deserialized);
    }

    #[test]
    fn history_path_follows_fired_transitions(
        edges in prop::collection::vec(edge_strategy(), 0..12),
        events in prop::collection::vec(0..KINDS.len(), 0..24),
    ) {
        let (table, _) = build(&edges);
        let machine = StateMachine::new(State::new(STATES[0]), table);

        for kind in events {
            let _ = machine.fire(Event::new(KINDS[kind]));
        }

        let history = machine.history();
        let records: Vec<_> = history.iter().collect();
        for pair in records.windows(2) {
            prop_assert_eq!(&pair[0].to, &pair[1].from);
        }
        if let Some(last) = history.last() {
            prop_assert_eq!(&last.to, &machine.current_state());
        }
    }
}
