//! Events and their kinds.
//!
//! Transitions are keyed by [`EventKind`], never by the concrete event value.
//! Every [`Event`] carries its kind explicitly, so resolution is a plain map
//! lookup instead of any kind of type inspection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use uuid::Uuid;

/// Discriminator of the reserved periodic event kind.
pub const PERIODIC_EVENT: &str = "PERIODIC_EVENT";

/// The kind of an event, used together with the source state to resolve a
/// transition.
///
/// [`EventKind::Periodic`] is reserved for events synthesized by the
/// periodic scheduler. Kinds compare by their string discriminator, so a
/// named kind spelled `"PERIODIC_EVENT"` is the periodic kind.
///
/// # Example
///
/// ```rust
/// use tickstate::core::EventKind;
///
/// let start = EventKind::named("START");
/// assert_eq!(start.as_str(), "START");
/// assert_eq!(EventKind::from("PERIODIC_EVENT"), EventKind::Periodic);
/// ```
#[derive(Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    /// Timer-driven event produced by the scheduler.
    Periodic,
    /// Caller-defined event kind.
    Named(Arc<str>),
}

impl EventKind {
    /// Create a caller-defined kind.
    ///
    /// The reserved discriminator maps to [`EventKind::Periodic`].
    pub fn named(name: impl AsRef<str>) -> Self {
        let name = name.as_ref();
        if name == PERIODIC_EVENT {
            Self::Periodic
        } else {
            Self::Named(Arc::from(name))
        }
    }

    /// Get the string discriminator.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Periodic => PERIODIC_EVENT,
            Self::Named(name) => &**name,
        }
    }

    /// Check whether this is the reserved periodic kind.
    pub fn is_periodic(&self) -> bool {
        self.as_str() == PERIODIC_EVENT
    }
}

impl PartialEq for EventKind {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for EventKind {}

impl Hash for EventKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl fmt::Debug for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventKind({})", self.as_str())
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for EventKind {
    fn from(name: &str) -> Self {
        Self::named(name)
    }
}

impl From<String> for EventKind {
    fn from(name: String) -> Self {
        Self::named(name)
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        kind.as_str().to_owned()
    }
}

/// A single occurrence that may trigger a transition.
///
/// Events are short-lived: each one is moved into exactly one
/// [`fire`](crate::engine::StateMachine::fire) call. The id and creation
/// time exist for correlation in logs and history.
///
/// # Example
///
/// ```rust
/// use tickstate::core::{Event, EventKind};
/// use serde_json::json;
///
/// let event = Event::new("ORDER_PLACED").with_payload(json!({ "order": 42 }));
/// assert_eq!(event.kind(), &EventKind::named("ORDER_PLACED"));
/// assert_eq!(event.payload().unwrap()["order"], 42);
///
/// assert!(Event::periodic().kind().is_periodic());
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Event {
    id: Uuid,
    kind: EventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
}

impl Event {
    /// Create an event of the given kind without payload.
    pub fn new(kind: impl Into<EventKind>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: kind.into(),
            payload: None,
            created_at: Utc::now(),
        }
    }

    /// Create the reserved periodic event.
    pub fn periodic() -> Self {
        Self::new(EventKind::Periodic)
    }

    /// Attach a payload.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    pub fn payload(&self) -> Option<&serde_json::Value> {
        self.payload.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
