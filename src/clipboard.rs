//! Clipboard integration

use crate::{ReadAloudError, Result};
use arboard::Clipboard;
use log::debug;

/// Get text from system clipboard
///
/// Used to paste a whole story in one keystroke.
pub fn get_from_clipboard() -> Result<String> {
    debug!("Getting text from clipboard");

    let mut clipboard = Clipboard::new()
        .map_err(|e| ReadAloudError::Clipboard(format!("Failed to open clipboard: {}", e)))?;

    clipboard
        .get_text()
        .map_err(|e| ReadAloudError::Clipboard(format!("Failed to read clipboard: {}", e)))
}
