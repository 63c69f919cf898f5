//! Marking options with explicit defaults, built once per call and never
//! mutated during a pass.
use indexmap::IndexMap;
use log::Level;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_MARKER_ELEMENT: &str = "mark";
pub const MARKER_ATTRIBUTE: &str = "data-markjs";

/// How tightly a match has to be bounded by whitespace or limiter characters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccuracyMode {
    #[default]
    Partially,
    Exactly,
    Complementary,
}

impl AccuracyMode {
    /// Boundaries used when the mode is given without an explicit limiter set.
    pub fn default_limiters(self) -> &'static [&'static str] {
        match self {
            AccuracyMode::Exactly => &[".", ",", ";", ":", "!", "?"],
            AccuracyMode::Partially | AccuracyMode::Complementary => &[],
        }
    }
}

impl fmt::Display for AccuracyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccuracyMode::Partially => write!(f, "partially"),
            AccuracyMode::Exactly => write!(f, "exactly"),
            AccuracyMode::Complementary => write!(f, "complementary"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Accuracy {
    Mode(AccuracyMode),
    Limited {
        value: AccuracyMode,
        limiters: Vec<String>,
    },
}

impl Default for Accuracy {
    fn default() -> Self {
        Accuracy::Mode(AccuracyMode::default())
    }
}

impl From<AccuracyMode> for Accuracy {
    fn from(mode: AccuracyMode) -> Self {
        Accuracy::Mode(mode)
    }
}

impl Accuracy {
    pub fn mode(&self) -> AccuracyMode {
        match self {
            Accuracy::Mode(mode) => *mode,
            Accuracy::Limited { value, .. } => *value,
        }
    }

    pub fn limiters(&self) -> Vec<&str> {
        match self {
            Accuracy::Mode(mode) => mode.default_limiters().to_vec(),
            Accuracy::Limited { limiters, .. } => limiters.iter().map(String::as_str).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkOptions {
    /// Marker element name; empty means `mark`.
    pub element: String,
    pub class_name: String,
    pub exclude: Vec<String>,
    pub iframes: bool,
    pub frame_timeout_ms: Option<u64>,
    pub separate_word_search: bool,
    pub diacritics: bool,
    pub synonyms: IndexMap<String, String>,
    pub accuracy: Accuracy,
    pub across_elements: bool,
    pub case_sensitive: bool,
    pub debug: bool,
}

impl Default for MarkOptions {
    fn default() -> Self {
        Self {
            element: String::new(),
            class_name: String::new(),
            exclude: Vec::new(),
            iframes: false,
            frame_timeout_ms: None,
            separate_word_search: true,
            diacritics: true,
            synonyms: IndexMap::new(),
            accuracy: Accuracy::default(),
            across_elements: false,
            case_sensitive: false,
            debug: false,
        }
    }
}

impl MarkOptions {
    pub fn marker_element(&self) -> &str {
        if self.element.is_empty() {
            DEFAULT_MARKER_ELEMENT
        } else {
            &self.element
        }
    }

    pub fn frame_timeout(&self) -> Option<Duration> {
        self.frame_timeout_ms.map(Duration::from_millis)
    }

    /// Diagnostics sink: only forwards to `log` when `debug` is enabled.
    pub fn log(&self, level: Level, message: impl fmt::Display) {
        if self.debug {
            log::log!(level, "treemark: {message}");
        }
    }
}
