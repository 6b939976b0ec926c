//! Transition handlers.

use crate::core::Event;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Failure raised by an [`EventHandler`].
pub type HandlerError = Box<dyn Error + Send + Sync + 'static>;

/// Side-effecting logic run when a transition fires.
///
/// The handler runs while the machine holds its firing lock, so it must not
/// fire events on the same machine. Returning an error aborts the
/// transition and leaves the machine in its source state.
///
/// Any `Fn(&Event) -> Result<(), HandlerError>` closure is a handler:
///
/// ```rust
/// use tickstate::core::Event;
/// use tickstate::engine::{EventHandler, HandlerError};
///
/// let handler = |event: &Event| -> Result<(), HandlerError> {
///     if event.payload().is_none() {
///         return Err("payload required".into());
///     }
///     Ok(())
/// };
/// assert!(handler.handle(&Event::new("SUBMIT")).is_err());
/// ```
pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &Event) -> Result<(), HandlerError>;
}

impl<F> EventHandler for F
where
    F: Fn(&Event) -> Result<(), HandlerError> + Send + Sync,
{
    fn handle(&self, event: &Event) -> Result<(), HandlerError> {
        self(event)
    }
}

/// Handler used by transitions built without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHandler;

impl EventHandler for NoopHandler {
    fn handle(&self, _event: &Event) -> Result<(), HandlerError> {
        Ok(())
    }
}

/// Shared handle to a handler.
#[derive(Clone)]
pub struct SharedHandler(Arc<dyn EventHandler>);

impl SharedHandler {
    pub fn new<H: EventHandler + 'static>(handler: H) -> Self {
        Self(Arc::new(handler))
    }

    pub fn handle(&self, event: &Event) -> Result<(), HandlerError> {
        self.0.handle(event)
    }
}

impl Default for SharedHandler {
    fn default() -> Self {
        Self::new(NoopHandler)
    }
}

impl From<Arc<dyn EventHandler>> for SharedHandler {
    fn from(handler: Arc<dyn EventHandler>) -> Self {
        Self(handler)
    }
}

impl fmt::Debug for SharedHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedHandler(..)")
    }
}
