//! Raw candidates returned by the time-parsing service.
//!
//! The service answers with a JSON array of annotations. Each carries a
//! dimension tag and a value payload that is either a single instant with a
//! grain or an interval with `from`/`to` endpoints. Older service builds nest
//! the payload under `values` instead of `value`; both are accepted.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::grain::Grain;

/// One annotation as received from the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCandidate {
    #[serde(default)]
    pub dim: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub values: Option<Vec<Value>>,
}

/// One endpoint of an interval.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Endpoint {
    pub value: String,
    #[serde(default)]
    pub grain: Option<String>,
}

/// A decoded candidate payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TimeValue {
    Value {
        value: String,
        #[serde(default)]
        grain: Option<String>,
    },
    Interval {
        #[serde(default)]
        from: Option<Endpoint>,
        #[serde(default)]
        to: Option<Endpoint>,
        #[serde(default)]
        grain: Option<String>,
    },
}

impl TimeValue {
    /// The reported grain, if it is one we recognize.
    pub fn grain(&self) -> Option<Grain> {
        match self {
            Self::Value { grain, .. } => Grain::parse_lenient(grain.as_deref()),
            Self::Interval { grain, from, .. } => Grain::parse_lenient(grain.as_deref())
                .or_else(|| Grain::parse_lenient(from.as_ref()?.grain.as_deref())),
        }
    }
}

impl RawCandidate {
    /// Shorthand for a `value`-typed time candidate.
    pub fn instant(value: &str, grain: &str) -> Self {
        Self {
            dim: Some("time".to_string()),
            body: None,
            value: Some(serde_json::json!({
                "type": "value",
                "value": value,
                "grain": grain,
            })),
            values: None,
        }
    }

    /// Shorthand for an `interval`-typed time candidate.
    pub fn interval(from: Option<&str>, to: Option<&str>) -> Self {
        let mut payload = serde_json::json!({ "type": "interval" });
        if let Some(from) = from {
            payload["from"] = serde_json::json!({ "value": from });
        }
        if let Some(to) = to {
            payload["to"] = serde_json::json!({ "value": to });
        }
        Self {
            dim: Some("time".to_string()),
            body: None,
            value: Some(payload),
            values: None,
        }
    }

    pub fn is_time(&self) -> bool {
        self.dim.as_deref() == Some("time")
    }

    /// The primary payload object: `value` when it is an object, else the
    /// first entry of `values`.
    pub fn primary(&self) -> Option<&Value> {
        match &self.value {
            Some(v) if v.is_object() => Some(v),
            _ => self.values.as_ref()?.first().filter(|v| v.is_object()),
        }
    }

    /// Decode the primary payload. Unknown or malformed shapes yield `None`.
    pub fn time_value(&self) -> Option<TimeValue> {
        serde_json::from_value(self.primary()?.clone()).ok()
    }

    /// The `(instant, grain)` of a `value`-typed candidate.
    pub fn instant_value(&self) -> Option<(String, Option<Grain>)> {
        match self.time_value()? {
            TimeValue::Value { value, grain } => {
                Some((value, Grain::parse_lenient(grain.as_deref())))
            }
            TimeValue::Interval { .. } => None,
        }
    }
}

/// Decode a service response body leniently.
///
/// The body must be a JSON array; elements that are not candidate objects
/// are skipped.
pub fn decode_candidates(body: &str) -> Result<Vec<RawCandidate>, serde_json::Error> {
    let items: Vec<Value> = serde_json::from_str(body)?;
    let total = items.len();
    let candidates: Vec<RawCandidate> = items
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();
    if candidates.len() < total {
        tracing::debug!(
            skipped = total - candidates.len(),
            "skipped malformed time candidates"
        );
    }
    Ok(candidates)
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {
            "body": "tháng 10",
            "start": 0,
            "end": 8,
            "dim": "time",
            "latent": false,
            "value": {
                "values": [
                    {"value": "2025-10-01T00:00:00.000+07:00", "grain": "month", "type": "value"}
                ],
                "value": "2025-10-01T00:00:00.000+07:00",
                "grain": "month",
                "type": "value"
            }
        },
        42,
        {
            "body": "từ 1 đến 5",
            "dim": "time",
            "value": {
                "type": "interval",
                "from": {"value": "2025-10-01T00:00:00.000+07:00", "grain": "day"},
                "to": {"value": "2025-10-06T00:00:00.000+07:00", "grain": "day"}
            }
        }
    ]"#;

    #[test]
    fn test_decode_skips_non_objects() {
        let candidates = decode_candidates(SAMPLE).unwrap();
        assert_eq!(candidates.len(), 2);
        assert!(candidates.iter().all(RawCandidate::is_time));
        assert_eq!(candidates[0].body.as_deref(), Some("tháng 10"));
    }

    #[test]
    fn test_decode_rejects_non_array() {
        assert!(decode_candidates(r#"{"error": "boom"}"#).is_err());
        assert!(decode_candidates("not json").is_err());
    }

    #[test]
    fn test_value_candidate() {
        let candidates = decode_candidates(SAMPLE).unwrap();
        let (value, grain) = candidates[0].instant_value().unwrap();
        assert_eq!(value, "2025-10-01T00:00:00.000+07:00");
        assert_eq!(grain, Some(Grain::Month));
    }

    #[test]
    fn test_interval_candidate_grain_from_endpoint() {
        let candidates = decode_candidates(SAMPLE).unwrap();
        let tv = candidates[1].time_value().unwrap();
        assert!(matches!(tv, TimeValue::Interval { .. }));
        assert_eq!(tv.grain(), Some(Grain::Day));
        assert!(candidates[1].instant_value().is_none());
    }

    #[test]
    fn test_values_list_fallback() {
        let candidate: RawCandidate = serde_json::from_str(
            r#"{"dim": "time", "values": [{"type": "value", "value": "2025-01-01T00:00:00Z", "grain": "year"}]}"#,
        )
        .unwrap();
        let (_, grain) = candidate.instant_value().unwrap();
        assert_eq!(grain, Some(Grain::Year));
    }

    #[test]
    fn test_malformed_payloads_decode_to_none() {
        let non_object = RawCandidate {
            dim: Some("time".to_string()),
            value: Some(Value::String("2025".to_string())),
            ..Default::default()
        };
        assert!(non_object.time_value().is_none());

        let unknown_type = RawCandidate {
            dim: Some("time".to_string()),
            value: Some(serde_json::json!({"type": "duration", "value": 3})),
            ..Default::default()
        };
        assert!(unknown_type.time_value().is_none());

        assert!(RawCandidate::default().time_value().is_none());
    }

    #[test]
    fn test_builders() {
        let c = RawCandidate::instant("2025-11-01T00:00:00.000+07:00", "month");
        assert_eq!(c.instant_value().unwrap().1, Some(Grain::Month));
        let i = RawCandidate::interval(Some("2025-11-01T00:00:00Z"), None);
        match i.time_value().unwrap() {
            TimeValue::Interval { from, to, .. } => {
                assert!(from.is_some());
                assert!(to.is_none());
            }
            other => panic!("expected interval, got {other:?}"),
        }
    }
}
