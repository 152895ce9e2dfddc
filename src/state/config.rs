//! Configuration management
//!
//! Settings are read from `~/.readaloud.cfg`, an INI file:
//!
//! ```ini
//! [speech]
//! backend = auto
//! rate = 1.0
//! pitch = 1.0
//! voice = Lekha
//!
//! [voices]
//! primary_locale = hi-IN
//! secondary_locale = en-IN
//!
//! [display]
//! highlight = reverse
//! ```
//!
//! Locale tags must match a voice's tag exactly. espeak-ng lists bare
//! tags such as `hi`, so with that backend use `primary_locale = hi`;
//! `readaloud --list-voices` shows the tags on offer.
//!
//! The file is only ever read; runtime changes are not written back.

use crate::coordinator::{LocalePreference, PlaybackParameters};
use crate::speech::BackendKind;
use crate::{ReadAloudError, Result};
use ini::Ini;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// How the spoken word is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightStyle {
    Reverse,
    Bold,
    Underline,
}

impl HighlightStyle {
    /// SGR sequences switching the style on and off
    pub fn sgr(&self) -> (&'static str, &'static str) {
        match self {
            HighlightStyle::Reverse => ("\x1b[7m", "\x1b[27m"),
            HighlightStyle::Bold => ("\x1b[1m", "\x1b[22m"),
            HighlightStyle::Underline => ("\x1b[4m", "\x1b[24m"),
        }
    }
}

impl FromStr for HighlightStyle {
    type Err = ReadAloudError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reverse" | "inverse" => Ok(HighlightStyle::Reverse),
            "bold" => Ok(HighlightStyle::Bold),
            "underline" => Ok(HighlightStyle::Underline),
            other => Err(ReadAloudError::Config(format!(
                "Unknown highlight style '{}'",
                other
            ))),
        }
    }
}

/// Application configuration
pub struct Config {
    /// INI configuration storage
    ini: Ini,

    /// Where the settings came from; may not exist
    path: PathBuf,
}

impl Config {
    /// Load configuration from `~/.readaloud.cfg`, or defaults if absent
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, or defaults if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", path);

        let ini = if path.exists() {
            Ini::load_from_file(path)
                .map_err(|e| ReadAloudError::IniParse(format!("Failed to load config: {}", e)))?
        } else {
            info!("Config file not found, using defaults");
            Self::default_config()
        };

        Ok(Self {
            ini,
            path: path.to_path_buf(),
        })
    }

    /// Parse configuration from a string
    pub fn from_ini_str(contents: &str) -> Result<Self> {
        let ini = Ini::load_from_str(contents)
            .map_err(|e| ReadAloudError::IniParse(format!("Failed to parse config: {}", e)))?;
        Ok(Self {
            ini,
            path: PathBuf::new(),
        })
    }

    /// Get config file path (~/.readaloud.cfg)
    fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".readaloud.cfg")
    }

    /// Expose the config file path for display
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create default configuration
    fn default_config() -> Ini {
        let mut ini = Ini::new();

        ini.with_section(Some("speech"))
            .set("backend", "auto")
            .set("rate", "1.0")
            .set("pitch", "1.0");

        ini.with_section(Some("voices"))
            .set("primary_locale", "hi-IN")
            .set("secondary_locale", "en-IN");

        ini.with_section(Some("display")).set("highlight", "reverse");

        ini
    }

    /// Get a string value from config
    pub fn get_string(&self, section: &str, key: &str, default: &str) -> String {
        self.ini
            .get_from(Some(section), key)
            .unwrap_or(default)
            .to_string()
    }

    /// Get a float value from config
    pub fn get_float(&self, section: &str, key: &str, default: f32) -> f32 {
        self.ini
            .get_from(Some(section), key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Which speech backend to use
    ///
    /// An unknown name falls back to auto with a warning.
    pub fn backend(&self) -> BackendKind {
        let name = self.get_string("speech", "backend", "auto");
        name.parse().unwrap_or_else(|e| {
            warn!("{}; using auto", e);
            BackendKind::Auto
        })
    }

    /// Initial speed and pitch, clamped to the control ranges
    pub fn playback(&self) -> PlaybackParameters {
        PlaybackParameters::new(
            self.get_float("speech", "rate", 1.0),
            self.get_float("speech", "pitch", 1.0),
        )
    }

    /// Voice name to prefer when it is available
    pub fn voice(&self) -> Option<String> {
        self.ini
            .get_from(Some("speech"), "voice")
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// Locale preferences for default voice selection
    pub fn locale_preference(&self) -> LocalePreference {
        let defaults = LocalePreference::default();
        LocalePreference {
            primary: self.get_string("voices", "primary_locale", &defaults.primary),
            secondary: self.get_string("voices", "secondary_locale", &defaults.secondary),
            preferred_voice: self.voice(),
        }
    }

    /// How to draw the spoken word
    pub fn highlight_style(&self) -> HighlightStyle {
        self.get_string("display", "highlight", "reverse")
            .parse()
            .unwrap_or_else(|e| {
                warn!("{}; using reverse", e);
                HighlightStyle::Reverse
            })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ini: Self::default_config(),
            path: Self::config_path(),
        }
    }
}
