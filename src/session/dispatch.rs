use log::debug;
use std::collections::HashMap;

use crate::error::Result;
use crate::protocol::DecodedMessage;

pub type Handler<C> = Box<dyn FnMut(&mut C, &DecodedMessage<'_>) -> Result<()>>;

/// Message type -> handler table. At most one handler per type; registering
/// again replaces the previous one.
pub struct Dispatcher<C> {
    handlers: HashMap<String, Handler<C>>,
}

impl<C> Dispatcher<C> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Returns true when an existing handler was replaced.
    pub fn register<F>(&mut self, kind: &str, handler: F) -> bool
    where
        F: FnMut(&mut C, &DecodedMessage<'_>) -> Result<()> + 'static,
    {
        let replaced = self.handlers.insert(kind.to_string(), Box::new(handler)).is_some();
        if replaced {
            debug!("Replaced handler for '{}'", kind);
        }
        replaced
    }

    pub fn unregister(&mut self, kind: &str) -> bool {
        self.handlers.remove(kind).is_some()
    }

    pub fn handles(&self, kind: &str) -> bool {
        self.handlers.contains_key(kind)
    }

    /// `None` when no handler is registered for the message type.
    pub fn dispatch(&mut self, context: &mut C, message: &DecodedMessage<'_>) -> Option<Result<()>> {
        let handler = self.handlers.get_mut(&message.kind)?;
        Some(handler(context, message))
    }
}

impl<C> Default for Dispatcher<C> {
    fn default() -> Self {
        Self::new()
    }
}
