//! Error types for readaloud

use std::io;
use thiserror::Error;

/// Main error type for readaloud
#[derive(Error, Debug)]
pub enum ReadAloudError {
    #[error("Terminal error: {0}")]
    Terminal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Speech synthesis error: {0}")]
    Speech(String),

    #[error("Voice not found: {0}")]
    VoiceNotFound(String),

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("INI parse error: {0}")]
    IniParse(String),

    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for readaloud operations
pub type Result<T> = std::result::Result<T, ReadAloudError>;

impl From<String> for ReadAloudError {
    fn from(s: String) -> Self {
        ReadAloudError::Other(s)
    }
}

impl From<&str> for ReadAloudError {
    fn from(s: &str) -> Self {
        ReadAloudError::Other(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = ReadAloudError::VoiceNotFound("Lekha".to_string());
        assert_eq!(err.to_string(), "Voice not found: Lekha");

        let err: ReadAloudError = "boom".into();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_io_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "missing");
        let err: ReadAloudError = io_err.into();
        assert!(matches!(err, ReadAloudError::Io(_)));
    }
}
