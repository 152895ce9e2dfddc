//! readaloud - terminal read-along narrator
//!
//! Reads a story (Hindi, English, or a mix of both) aloud through the
//! platform's text-to-speech engine and highlights each word as it is spoken.

pub mod clipboard;
pub mod coordinator;
pub mod error;
pub mod input;
pub mod platform;
pub mod speech;
pub mod state;
pub mod terminal;

pub use error::{ReadAloudError, Result};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "readaloud";
