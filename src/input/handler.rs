//! Key handler system with modal input support

use crate::state::State;
use crate::Result;

/// Action to take after processing a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerAction {
    /// Not for this handler; let the default bindings have it
    Passthrough,
    /// Remove this handler from the stack
    Remove,
    /// Key was handled, do nothing more
    Handled,
}

/// A key handler processes keyboard input
pub trait KeyHandler {
    /// Process a key sequence with access to the application state
    fn process(&mut self, key: &[u8], state: &mut State) -> Result<HandlerAction>;

    /// Text shown in the status line while this handler is active
    fn label(&self) -> Option<String> {
        None
    }
}

/// Stack of modal key handlers (last one processes input first)
#[derive(Default)]
pub struct HandlerStack {
    handlers: Vec<Box<dyn KeyHandler>>,
}

impl HandlerStack {
    /// Create a new handler stack
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a handler onto the stack
    pub fn push(&mut self, handler: Box<dyn KeyHandler>) {
        self.handlers.push(handler);
    }

    /// Pop the top handler from the stack
    pub fn pop(&mut self) -> Option<Box<dyn KeyHandler>> {
        self.handlers.pop()
    }

    /// Label of the handler on top, if it has one
    pub fn top_label(&self) -> Option<String> {
        self.handlers.last().and_then(|h| h.label())
    }

    /// Get the number of handlers in the stack
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check if the stack is empty
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
