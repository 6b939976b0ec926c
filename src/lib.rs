//! Tickstate: a finite state machine engine
//!
//! A machine is a fixed table of transitions keyed by source state and event
//! kind. Firing an event resolves one transition, runs its handler and moves
//! to the target state only if the handler succeeded. Periodic transitions are
//! driven by timers that fire the reserved periodic event.
//!
//! # Core Concepts
//!
//! - **State** and **Event**: plain values in [`core`]
//! - **Transition table** and **state machine**: the firing engine in [`engine`]
//! - **Builders**: validated construction in [`builder`]
//! - **Periodic scheduler**: Tokio timers in [`scheduler`]
//!
//! # Example
//!
//! ```rust
//! use tickstate::builder::StateMachineBuilder;
//! use tickstate::core::{Event, State};
//! use tickstate::engine::{FireError, Transition};
//!
//! let machine = StateMachineBuilder::new(["IDLE", "RUNNING", "DONE"], "IDLE")
//!     .transition(Transition::builder().name("start").from("IDLE").to("RUNNING").on("START"))
//!     .unwrap()
//!     .transition(Transition::builder().name("finish").from("RUNNING").to("DONE").on("FINISH"))
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(machine.fire(Event::new("START")).unwrap(), State::new("RUNNING"));
//! assert_eq!(machine.fire(Event::new("FINISH")).unwrap(), State::new("DONE"));
//!
//! let err = machine.fire(Event::new("START")).unwrap_err();
//! assert!(matches!(err, FireError::NoTransitionForEvent { .. }));
//! assert_eq!(machine.current_state(), State::new("DONE"));
//! ```

pub mod builder;
pub mod config;
pub mod core;
pub mod engine;
pub mod scheduler;

// Re-export commonly used types
pub use crate::builder::{BuildError, StateMachineBuilder};
pub use crate::config::{MachineConfig, OverlapPolicy, SchedulerConfig};
pub use crate::core::{Event, EventKind, State, StateHistory, StateTransition};
pub use crate::engine::{
    DuplicateTransitionError, EventHandler, FireError, HandlerError, StateMachine, Transition,
    TransitionTable,
};
pub use crate::scheduler::{
    FailureSink, PeriodicEventScheduler, SchedulerError, TickError, TickFailure,
};
