//! The transition engine.
//!
//! # Key Concepts
//!
//! - **Transitions**: immutable `(source, event kind) -> target` edges with
//!   a handler
//! - **Transition table**: unique index of edges, built once
//! - **State machine**: resolves and fires events under a per-machine lock
//!
//! Firing is a single synchronous step: resolve, run the handler, then move
//! to the target state only if the handler succeeded.

mod error;
mod handler;
mod machine;
mod table;
mod transition;

pub use error::{DuplicateTransitionError, FireError};
pub use handler::{EventHandler, HandlerError, NoopHandler, SharedHandler};
pub use machine::StateMachine;
pub use table::TransitionTable;
pub use transition::Transition;
