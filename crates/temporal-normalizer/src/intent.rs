//! Intent gate.
//!
//! An [`IntentClassifier`] proposes a label with a confidence. The
//! [`IntentCatalog`] then decides two things: whether a low-confidence label
//! is replaced by the fallback label, and whether the final label asks for
//! temporal parsing.

use serde::{Deserialize, Serialize};

use crate::settings::IntentSettings;

const LABEL_PREFIX: &str = "__label__";

/// A classifier's answer for one utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub confidence: f64,
}

impl Prediction {
    /// Build a prediction, stripping a leading `__label__` from `label`.
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        let label = label.into();
        let label = match label.strip_prefix(LABEL_PREFIX) {
            Some(stripped) => stripped.to_string(),
            None => label,
        };
        Self { label, confidence }
    }
}

/// Maps an utterance to an intent label.
pub trait IntentClassifier: Send + Sync {
    fn predict(&self, text: &str) -> Prediction;

    /// Behaviour the classifier itself declares for `label`, for labels it
    /// can produce that the catalog may not know about.
    fn declared_spec(&self, _label: &str) -> Option<IntentSpec> {
        None
    }
}

/// Always answers with the same prediction. Handy in tests and for wiring a
/// pipeline whose intent is already known.
#[derive(Debug, Clone)]
pub struct FixedClassifier {
    prediction: Prediction,
}

impl FixedClassifier {
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            prediction: Prediction::new(label, confidence),
        }
    }
}

impl IntentClassifier for FixedClassifier {
    fn predict(&self, _text: &str) -> Prediction {
        self.prediction.clone()
    }
}

/// Per-label behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentSpec {
    pub label: String,
    #[serde(default)]
    pub needs_temporal_parsing: bool,
    /// Keep this label even when its confidence is under the threshold.
    #[serde(default)]
    pub bypass_confidence_gate: bool,
}

impl IntentSpec {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            needs_temporal_parsing: false,
            bypass_confidence_gate: false,
        }
    }

    pub fn temporal(label: &str) -> Self {
        Self {
            needs_temporal_parsing: true,
            ..Self::new(label)
        }
    }

    pub fn bypassing(label: &str) -> Self {
        Self {
            bypass_confidence_gate: true,
            ..Self::new(label)
        }
    }
}

/// The built-in HR assistant intents.
pub fn default_catalog() -> Vec<IntentSpec> {
    let mut catalog = vec![
        IntentSpec::bypassing("WELCOME"),
        IntentSpec::bypassing("NOT_FOUND"),
        IntentSpec::new("HELP_INFORMATION"),
        IntentSpec::new("HELP_PERSONAL"),
        IntentSpec::new("FALLBACK"),
    ];
    catalog.extend(
        [
            "NGAYCONG_MON",
            "NGAYCONG_TODAY",
            "NGAYCONG_YESTERDAY",
            "NGAYCONG_FROMTO",
            "NGAYPHEPNAM_YEAR",
            "NGAYPHEPNAM_FROMTO",
            "NGAYNGHI_YEAR",
            "PAYROLL_PERSONAL",
            "ATTENDANCE_PERSONAL",
        ]
        .into_iter()
        .map(IntentSpec::temporal),
    );
    catalog
}

/// Lookup table plus the confidence gate.
///
/// Labels missing from the catalog are gated normally. Whether they ask for
/// temporal parsing comes only from a declared [`IntentSpec`], such as the
/// flag stored with each [`KeyRegistry`] entry; the label text is never
/// inspected.
///
/// [`KeyRegistry`]: crate::registry::KeyRegistry
#[derive(Debug, Clone)]
pub struct IntentCatalog {
    specs: Vec<IntentSpec>,
    confidence_threshold: f64,
    fallback_label: String,
}

impl Default for IntentCatalog {
    fn default() -> Self {
        Self::from_settings(&IntentSettings::default())
    }
}

impl IntentCatalog {
    pub fn from_settings(settings: &IntentSettings) -> Self {
        Self {
            specs: settings.catalog.clone(),
            confidence_threshold: settings.confidence_threshold,
            fallback_label: settings.fallback_label.clone(),
        }
    }

    pub fn get(&self, label: &str) -> Option<&IntentSpec> {
        self.specs.iter().find(|s| s.label == label)
    }

    pub fn fallback_label(&self) -> &str {
        &self.fallback_label
    }

    /// Replace a low-confidence prediction's label with the fallback label.
    /// The confidence is reported unchanged.
    pub fn gate(&self, prediction: Prediction) -> Prediction {
        let bypass = self
            .get(&prediction.label)
            .is_some_and(|s| s.bypass_confidence_gate);
        if bypass || prediction.confidence >= self.confidence_threshold {
            return prediction;
        }
        tracing::debug!(
            label = %prediction.label,
            confidence = prediction.confidence,
            threshold = self.confidence_threshold,
            "low confidence, using fallback intent"
        );
        Prediction {
            label: self.fallback_label.clone(),
            confidence: prediction.confidence,
        }
    }

    /// The catalog entry decides when there is one; otherwise `declared`
    /// does. A label with neither never triggers temporal parsing.
    pub fn needs_temporal_parsing(&self, label: &str, declared: Option<&IntentSpec>) -> bool {
        self.get(label)
            .or(declared)
            .is_some_and(|spec| spec.needs_temporal_parsing)
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_strips_label_prefix() {
        let p = Prediction::new("__label__NGAYCONG_MON", 0.91);
        assert_eq!(p.label, "NGAYCONG_MON");
        assert_eq!(Prediction::new("WELCOME", 1.0).label, "WELCOME");
    }

    #[test]
    fn test_gate_keeps_confident_prediction() {
        let catalog = IntentCatalog::default();
        let p = catalog.gate(Prediction::new("PAYROLL_PERSONAL", 0.7));
        assert_eq!(p.label, "PAYROLL_PERSONAL");
    }

    #[test]
    fn test_gate_replaces_low_confidence() {
        let catalog = IntentCatalog::default();
        let p = catalog.gate(Prediction::new("NGAYCONG_MON", 0.42));
        assert_eq!(p.label, "FALLBACK");
        assert_eq!(p.confidence, 0.42);
    }

    #[test]
    fn test_gate_welcome_bypasses_threshold() {
        let catalog = IntentCatalog::default();
        assert_eq!(catalog.gate(Prediction::new("WELCOME", 0.1)).label, "WELCOME");
        assert_eq!(catalog.gate(Prediction::new("NOT_FOUND", 0.0)).label, "NOT_FOUND");
    }

    #[test]
    fn test_gate_unknown_label_is_gated() {
        let catalog = IntentCatalog::default();
        assert_eq!(catalog.gate(Prediction::new("SOMETHING", 0.2)).label, "FALLBACK");
        assert_eq!(catalog.gate(Prediction::new("SOMETHING", 0.9)).label, "SOMETHING");
    }

    #[test]
    fn test_needs_temporal_parsing_from_catalog() {
        let catalog = IntentCatalog::default();
        assert!(catalog.needs_temporal_parsing("NGAYCONG_FROMTO", None));
        assert!(catalog.needs_temporal_parsing("ATTENDANCE_PERSONAL", None));
        assert!(!catalog.needs_temporal_parsing("WELCOME", None));
        assert!(!catalog.needs_temporal_parsing("FALLBACK", None));
        assert!(!catalog.needs_temporal_parsing("HELP_PERSONAL", None));
    }

    #[test]
    fn test_uncatalogued_label_text_is_not_inspected() {
        let catalog = IntentCatalog::default();
        assert!(!catalog.needs_temporal_parsing("DOI_CONG_CU", None));
        assert!(!catalog.needs_temporal_parsing("bang_luong_thang", None));
        assert!(!catalog.needs_temporal_parsing("XEM_NGAY_NGHI", None));
    }

    #[test]
    fn test_declared_spec_decides_for_uncatalogued_label() {
        let catalog = IntentCatalog::default();
        let declared = IntentSpec::temporal("BANG_CHAM_CONG");
        assert!(catalog.needs_temporal_parsing("BANG_CHAM_CONG", Some(&declared)));
        let declared = IntentSpec::new("DOI_CONG_CU");
        assert!(!catalog.needs_temporal_parsing("DOI_CONG_CU", Some(&declared)));
    }

    #[test]
    fn test_catalog_entry_outranks_declared_spec() {
        let catalog = IntentCatalog::default();
        let declared = IntentSpec::new("NGAYCONG_MON");
        assert!(catalog.needs_temporal_parsing("NGAYCONG_MON", Some(&declared)));
    }

    #[test]
    fn test_catalog_from_custom_settings() {
        let settings = IntentSettings {
            confidence_threshold: 0.5,
            fallback_label: "UNKNOWN".to_string(),
            catalog: vec![IntentSpec::temporal("SHIFT_SCHEDULE")],
        };
        let catalog = IntentCatalog::from_settings(&settings);
        assert_eq!(catalog.fallback_label(), "UNKNOWN");
        assert_eq!(catalog.gate(Prediction::new("SHIFT_SCHEDULE", 0.4)).label, "UNKNOWN");
        assert!(catalog.needs_temporal_parsing("SHIFT_SCHEDULE", None));
        assert!(!catalog.needs_temporal_parsing("NGAYCONG_MON", None));
    }

    #[test]
    fn test_fixed_classifier() {
        let classifier = FixedClassifier::new("__label__WELCOME", 0.99);
        assert!(classifier.declared_spec("WELCOME").is_none());
        let p = classifier.predict("xin chào");
        assert_eq!(p, Prediction::new("WELCOME", 0.99));
    }
}
