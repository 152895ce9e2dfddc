//! Voice descriptors enumerated by a speech backend

use serde::{Deserialize, Serialize};
use std::fmt;

/// A voice the platform offers
///
/// Descriptors are owned by the backend that listed them; callers keep
/// copies and refer back to a voice by `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceDescriptor {
    /// Backend-specific identifier used to select the voice
    pub id: String,
    /// Human readable name, unique within one listing
    pub name: String,
    /// BCP-47 language tag, e.g. `hi-IN`
    pub language: String,
}

impl VoiceDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            language: language.into(),
        }
    }

    /// Whether this voice's tag is the same tag as `locale`
    pub fn speaks(&self, locale: &str) -> bool {
        same_language_tag(&self.language, locale)
    }
}

impl fmt::Display for VoiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.language)
    }
}

/// Compare two language tags
///
/// Tags are case-insensitive and some engines write `hi_IN` for `hi-IN`.
pub fn same_language_tag(a: &str, b: &str) -> bool {
    let a = a.trim();
    let b = b.trim();
    a.len() == b.len()
        && a.chars().zip(b.chars()).all(|(x, y)| {
            let x = if x == '_' { '-' } else { x };
            let y = if y == '_' { '-' } else { y };
            x.eq_ignore_ascii_case(&y)
        })
}
