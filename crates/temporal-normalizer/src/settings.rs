//! Runtime settings.
//!
//! Loaded from an optional file, then environment variables prefixed
//! `TNORM` (`TNORM_DUCKLING__URL`, `TNORM_INTENTS__CONFIDENCE_THRESHOLD`).
//! Every field has a default, so an empty source yields [`Settings::default`].

use std::path::Path;

use chrono::Utc;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::intent::{default_catalog, IntentSpec};
use crate::zone;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub duckling: DucklingSettings,
    #[serde(default)]
    pub normalizer: NormalizerSettings,
    #[serde(default)]
    pub intents: IntentSettings,
}

/// Where and how to reach the time-parsing service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DucklingSettings {
    #[serde(default = "default_duckling_url")]
    pub url: String,
    #[serde(default = "default_locale")]
    pub locale: String,
    /// Whole-request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_duckling_url() -> String {
    "http://localhost:8085/parse".to_string()
}

fn default_locale() -> String {
    "vi_VN".to_string()
}

fn default_timeout_ms() -> u64 {
    5000
}

impl Default for DucklingSettings {
    fn default() -> Self {
        Self {
            url: default_duckling_url(),
            locale: default_locale(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizerSettings {
    /// IANA name (`Asia/Ho_Chi_Minh`) or a literal offset (`+07:00`).
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_true")]
    pub inclusive_end: bool,
    #[serde(default)]
    pub shift_early_hours: bool,
    #[serde(default)]
    pub pull_future_single_back: bool,
}

fn default_timezone() -> String {
    "Asia/Ho_Chi_Minh".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for NormalizerSettings {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            inclusive_end: true,
            shift_early_hours: false,
            pull_future_single_back: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentSettings {
    /// Predictions below this confidence become `fallback_label`.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    #[serde(default = "default_fallback_label")]
    pub fallback_label: String,
    #[serde(default = "default_catalog")]
    pub catalog: Vec<IntentSpec>,
}

fn default_confidence_threshold() -> f64 {
    0.7
}

fn default_fallback_label() -> String {
    "FALLBACK".to_string()
}

impl Default for IntentSettings {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            fallback_label: default_fallback_label(),
            catalog: default_catalog(),
        }
    }
}

impl Settings {
    /// Check value ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] naming the first offending field, or
    /// [`EngineError::InvalidTimezone`] for an unknown timezone.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.duckling.url.trim().is_empty() {
            return Err(EngineError::Config("duckling.url must not be empty".to_string()));
        }
        if self.duckling.timeout_ms == 0 {
            return Err(EngineError::Config(
                "duckling.timeout_ms must be greater than zero".to_string(),
            ));
        }
        let threshold = self.intents.confidence_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(EngineError::Config(format!(
                "intents.confidence_threshold must be between 0.0 and 1.0, got {}",
                threshold
            )));
        }
        if self.intents.fallback_label.trim().is_empty() {
            return Err(EngineError::Config(
                "intents.fallback_label must not be empty".to_string(),
            ));
        }
        zone::resolve_offset(&self.normalizer.timezone, Utc::now())?;
        Ok(())
    }
}

/// Load settings from `path` (format from its extension) overlaid with
/// `TNORM_*` environment variables, then validate.
///
/// # Errors
///
/// Returns [`EngineError::Config`] when a source cannot be read or
/// deserialized, or any error from [`Settings::validate`].
pub fn load_settings(path: Option<&Path>) -> Result<Settings, EngineError> {
    let mut builder = Config::builder();

    if let Some(path) = path {
        builder = builder.add_source(File::from(path).required(true));
    }

    builder = builder.add_source(
        Environment::with_prefix("TNORM")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let settings: Settings = builder.build()?.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}

// ── Tests ───────────────────────────────────────────────────────────────────
