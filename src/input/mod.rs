//! Input handling and key bindings
//!
//! The input system uses a stack-based handler architecture where handlers
//! can be pushed/popped to create modal interfaces (edit mode, prompts).

pub mod default_handler;
pub mod edit_handler;
pub mod handler;
pub mod keymap;
pub mod prompt_handler;

pub use default_handler::DefaultKeyHandler;
pub use handler::{HandlerAction, HandlerStack, KeyHandler};
pub use keymap::{create_default_keymap, KeyAction};

use crate::state::State;
use crate::Result;

/// Route one chunk of keyboard input
///
/// The top modal handler sees the input first; if it passes the key
/// through, or there is no modal handler, the default bindings get it.
pub fn dispatch(input: &[u8], state: &mut State, default_handler: &mut DefaultKeyHandler) -> Result<()> {
    if let Some(mut handler) = state.handlers.pop() {
        // Popped while it runs so it can borrow the state mutably
        let result = handler.process(input, state);
        match result {
            Ok(HandlerAction::Remove) => return Ok(()),
            Ok(HandlerAction::Handled) => {
                state.handlers.push(handler);
                return Ok(());
            }
            Ok(HandlerAction::Passthrough) => state.handlers.push(handler),
            Err(e) => {
                state.handlers.push(handler);
                return Err(e);
            }
        }
    }

    default_handler.process(input, state)?;
    Ok(())
}
