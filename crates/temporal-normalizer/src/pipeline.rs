//! End-to-end assembly: intent gate, time service, normalizer.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::gateway::{DucklingGateway, TimeParser};
use crate::intent::{IntentCatalog, IntentClassifier};
use crate::normalize::Normalizer;
use crate::result::NormalizedTimeResult;
use crate::settings::Settings;

/// What the pipeline answers for one utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub intent: String,
    /// Classifier confidence, rounded to two decimals.
    pub confidence: f64,
    pub time: NormalizedTimeResult,
}

pub struct TemporalPipeline<C, P> {
    classifier: C,
    catalog: IntentCatalog,
    parser: P,
    normalizer: Normalizer,
}

impl<C: IntentClassifier> TemporalPipeline<C, DucklingGateway> {
    /// Wire `classifier` to a Duckling gateway and normalizer built from
    /// `settings`.
    ///
    /// # Errors
    ///
    /// Propagates gateway construction and timezone resolution failures.
    pub fn from_settings(classifier: C, settings: &Settings) -> Result<Self, EngineError> {
        Ok(Self::new(
            classifier,
            IntentCatalog::from_settings(&settings.intents),
            DucklingGateway::new(settings.duckling.clone())?,
            Normalizer::from_settings(&settings.normalizer)?,
        ))
    }
}

impl<C: IntentClassifier, P: TimeParser> TemporalPipeline<C, P> {
    pub fn new(classifier: C, catalog: IntentCatalog, parser: P, normalizer: Normalizer) -> Self {
        Self {
            classifier,
            catalog,
            parser,
            normalizer,
        }
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Classify `text`, gate the label, and resolve its time expression when
    /// the final label asks for one.
    pub fn respond(&self, text: &str, reference: DateTime<FixedOffset>) -> PredictionResponse {
        let prediction = self.catalog.gate(self.classifier.predict(text));
        let declared = self.classifier.declared_spec(&prediction.label);
        let time = if self
            .catalog
            .needs_temporal_parsing(&prediction.label, declared.as_ref())
        {
            self.resolve_time(text, reference)
        } else {
            NormalizedTimeResult::None
        };
        tracing::debug!(intent = %prediction.label, confidence = prediction.confidence, "prediction assembled");
        PredictionResponse {
            intent: prediction.label,
            confidence: round2(prediction.confidence),
            time,
        }
    }

    /// [`respond`](Self::respond) against wall-clock now.
    pub fn respond_now(&self, text: &str) -> PredictionResponse {
        self.respond(text, self.normalizer.now())
    }

    /// Parse and normalize `text` without consulting the classifier.
    pub fn resolve_time(&self, text: &str, reference: DateTime<FixedOffset>) -> NormalizedTimeResult {
        let outcome = self.parser.parse(text, reference);
        self.normalizer.normalize(&outcome.candidates, text, reference)
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::RawCandidate;
    use crate::gateway::StaticParser;
    use crate::intent::FixedClassifier;
    use crate::registry::{KeyRegistry, KeywordClassifier};
    use crate::settings::DucklingSettings;
    use serde_json::json;

    fn reference() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2025-10-20T00:00:00+07:00").unwrap()
    }

    fn month_parser() -> StaticParser {
        StaticParser::new(vec![RawCandidate::instant(
            "2025-09-01T00:00:00.000+07:00",
            "month",
        )])
    }

    fn pipeline<C: IntentClassifier>(classifier: C) -> TemporalPipeline<C, StaticParser> {
        TemporalPipeline::new(
            classifier,
            IntentCatalog::default(),
            month_parser(),
            Normalizer::default(),
        )
    }

    #[test]
    fn test_temporal_intent_resolves_time() {
        let p = pipeline(FixedClassifier::new("__label__PAYROLL_PERSONAL", 0.8765));
        let response = p.respond("xem lương tháng 9", reference());
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "intent": "PAYROLL_PERSONAL",
                "confidence": 0.88,
                "time": {
                    "type": "range",
                    "grain": "month",
                    "start": "2025-09-01T00:00:00+07:00",
                    "end": "2025-09-30T23:59:59+07:00"
                }
            })
        );
    }

    #[test]
    fn test_low_confidence_falls_back_without_time() {
        let p = pipeline(FixedClassifier::new("NGAYCONG_MON", 0.31));
        let response = p.respond("xem công tháng 9", reference());
        assert_eq!(response.intent, "FALLBACK");
        assert_eq!(response.confidence, 0.31);
        assert!(response.time.is_none());
    }

    #[test]
    fn test_welcome_skips_time_parsing() {
        let p = pipeline(FixedClassifier::new("WELCOME", 0.2));
        let response = p.respond("chào bạn hôm nay", reference());
        assert_eq!(response.intent, "WELCOME");
        assert!(response.time.is_none());
    }

    #[test]
    fn test_keyword_classifier_pipeline() {
        let registry = KeyRegistry::new();
        registry.push("ngày công", "NGAYCONG_TODAY").unwrap();
        let p = pipeline(KeywordClassifier::new(registry.clone()));

        let hit = p.respond("ngày công hôm nay", reference());
        assert_eq!(hit.intent, "NGAYCONG_TODAY");
        assert_eq!(hit.confidence, 0.95);
        assert_eq!(
            hit.time,
            NormalizedTimeResult::single_day("2025-10-20T00:00:00+07:00".to_string())
        );

        let miss = p.respond("đổi mật khẩu", reference());
        assert_eq!(miss.intent, "NOT_FOUND");
        assert_eq!(miss.confidence, 0.0);
        assert!(miss.time.is_none());
    }

    #[test]
    fn test_registry_keys_resolve_time_only_when_declared() {
        let registry = KeyRegistry::new();
        registry.push("đổi công cụ", "DOI_CONG_CU").unwrap();
        registry.push_temporal("bảng chấm công", "BANG_CHAM_CONG").unwrap();
        let p = pipeline(KeywordClassifier::new(registry));

        let plain = p.respond("đổi công cụ tháng 9", reference());
        assert_eq!(plain.intent, "DOI_CONG_CU");
        assert!(plain.time.is_none());

        let temporal = p.respond("bảng chấm công tháng 9", reference());
        assert_eq!(temporal.intent, "BANG_CHAM_CONG");
        assert_eq!(temporal.time.grain(), Some(crate::grain::Grain::Month));
    }

    #[test]
    fn test_resolve_time_ignores_intent() {
        let p = pipeline(FixedClassifier::new("FALLBACK", 0.0));
        let result = p.resolve_time("lương tháng 9", reference());
        assert_eq!(result.grain(), Some(crate::grain::Grain::Month));
    }

    #[test]
    fn test_unreachable_service_yields_none() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let mut settings = Settings::default();
        settings.duckling = DucklingSettings {
            url: format!("http://127.0.0.1:{port}/parse"),
            timeout_ms: 300,
            ..DucklingSettings::default()
        };
        let p = TemporalPipeline::from_settings(
            FixedClassifier::new("NGAYCONG_MON", 0.99),
            &settings,
        )
        .unwrap();
        let response = p.respond("xem công tháng 10", reference());
        assert_eq!(response.intent, "NGAYCONG_MON");
        assert_eq!(serde_json::to_value(&response.time).unwrap(), json!({"type": "none"}));
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(0.954_9), 0.95);
        assert_eq!(round2(0.876), 0.88);
        assert_eq!(round2(1.0), 1.0);
    }
}
