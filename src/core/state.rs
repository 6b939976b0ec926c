//! Named machine states.
//!
//! A state is nothing more than an identity. Two states are the same state
//! when their names match, no matter where each value was created.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// A named point in a machine's state space.
///
/// States are immutable and cheap to clone: the name is shared, so a table
/// holding hundreds of transitions that reference the same state keeps a
/// single copy of the string.
///
/// # Example
///
/// ```rust
/// use tickstate::core::State;
///
/// let idle = State::new("IDLE");
/// assert_eq!(idle.name(), "IDLE");
/// assert_eq!(idle, State::from("IDLE"));
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State {
    name: Arc<str>,
}

impl State {
    /// Create a state with the given name.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
        }
    }

    /// Get the state's name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "State({})", self.name)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl From<&str> for State {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for State {
    fn from(name: String) -> Self {
        Self {
            name: Arc::from(name),
        }
    }
}

impl From<&State> for State {
    fn from(state: &State) -> Self {
        state.clone()
    }
}

impl Borrow<str> for State {
    fn borrow(&self) -> &str {
        &self.name
    }
}
