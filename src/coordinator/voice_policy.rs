//! Default voice selection

use crate::speech::VoiceDescriptor;

/// Locales the story is expected to be in, most wanted first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalePreference {
    pub primary: String,
    pub secondary: String,
    /// Voice name requested in the config file, tried before the locales
    pub preferred_voice: Option<String>,
}

impl Default for LocalePreference {
    fn default() -> Self {
        Self {
            primary: "hi-IN".to_string(),
            secondary: "en-IN".to_string(),
            preferred_voice: None,
        }
    }
}

/// Pick a voice for a fresh list
///
/// Order: the configured voice name, an exact primary-locale match, an
/// exact secondary-locale match, then the first voice.
pub fn choose_default<'a>(
    voices: &'a [VoiceDescriptor],
    prefs: &LocalePreference,
) -> Option<&'a VoiceDescriptor> {
    let by_name = prefs
        .preferred_voice
        .as_deref()
        .and_then(|name| voices.iter().find(|v| v.name == name));

    by_name
        .or_else(|| voices.iter().find(|v| v.speaks(&prefs.primary)))
        .or_else(|| voices.iter().find(|v| v.speaks(&prefs.secondary)))
        .or_else(|| voices.first())
}

/// Reconcile a selection with a refreshed list
///
/// A selection still present in the list is kept; otherwise the default
/// policy runs again. Returns the name of the voice to select.
pub fn reconcile(
    current: Option<&str>,
    voices: &[VoiceDescriptor],
    prefs: &LocalePreference,
) -> Option<String> {
    if let Some(name) = current {
        if voices.iter().any(|v| v.name == name) {
            return Some(name.to_string());
        }
    }
    choose_default(voices, prefs).map(|v| v.name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voices() -> Vec<VoiceDescriptor> {
        vec![
            VoiceDescriptor::new("a", "A", "en-US"),
            VoiceDescriptor::new("b", "B", "hi-IN"),
            VoiceDescriptor::new("c", "C", "en-IN"),
        ]
    }

    #[test]
    fn test_primary_locale_wins() {
        let list = voices();
        let chosen = choose_default(&list, &LocalePreference::default());
        assert_eq!(chosen.map(|v| v.name.as_str()), Some("B"));
    }

    #[test]
    fn test_secondary_locale() {
        let list = vec![
            VoiceDescriptor::new("a", "A", "en-US"),
            VoiceDescriptor::new("c", "C", "en-IN"),
        ];
        let chosen = choose_default(&list, &LocalePreference::default());
        assert_eq!(chosen.map(|v| v.name.as_str()), Some("C"));
    }

    #[test]
    fn test_first_voice_fallback() {
        let list = vec![
            VoiceDescriptor::new("f", "F", "fr-FR"),
            VoiceDescriptor::new("d", "D", "de-DE"),
        ];
        let chosen = choose_default(&list, &LocalePreference::default());
        assert_eq!(chosen.map(|v| v.name.as_str()), Some("F"));
        assert!(choose_default(&[], &LocalePreference::default()).is_none());
    }

    #[test]
    fn test_preferred_voice_name() {
        let prefs = LocalePreference {
            preferred_voice: Some("A".to_string()),
            ..LocalePreference::default()
        };
        assert_eq!(choose_default(&voices(), &prefs).map(|v| v.name.as_str()), Some("A"));

        let missing = LocalePreference {
            preferred_voice: Some("Z".to_string()),
            ..LocalePreference::default()
        };
        assert_eq!(choose_default(&voices(), &missing).map(|v| v.name.as_str()), Some("B"));
    }

    #[test]
    fn test_reconcile_keeps_present_selection() {
        let prefs = LocalePreference::default();
        assert_eq!(reconcile(Some("C"), &voices(), &prefs), Some("C".to_string()));
        assert_eq!(reconcile(Some("gone"), &voices(), &prefs), Some("B".to_string()));
        assert_eq!(reconcile(None, &voices(), &prefs), Some("B".to_string()));
        assert_eq!(reconcile(Some("C"), &[], &prefs), None);
    }
}
