//! Core value types.
//!
//! This module contains the plain data the engine moves around:
//! - [`State`]: named identity of a machine state
//! - [`Event`] and [`EventKind`]: occurrences and the discriminator used
//!   to resolve transitions
//! - [`StateHistory`]: bounded record of completed transitions
//!
//! Nothing here holds locks or spawns tasks.

mod event;
mod history;
mod state;

pub use event::{Event, EventKind, PERIODIC_EVENT};
pub use history::{StateHistory, StateTransition};
pub use state::State;
