//! The canonical time result handed to downstream consumers.

use serde::{Deserialize, Serialize};

use crate::grain::Grain;

/// Outcome of one normalization pass, serialized with a `type` tag:
///
/// - `{"type": "none"}`
/// - `{"type": "single", "grain": "day", "date_start": .., "date_end": ..}`
/// - `{"type": "range", "grain": .., "start": .., "end": ..}`
///
/// Timestamps are ISO 8601 with a UTC offset. A `range` endpoint may be
/// `null` when the service reported a half-open interval.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NormalizedTimeResult {
    #[default]
    None,
    Single {
        grain: Grain,
        date_start: String,
        date_end: String,
    },
    Range {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        grain: Option<Grain>,
        start: Option<String>,
        end: Option<String>,
    },
}

impl NormalizedTimeResult {
    pub fn single_day(date: String) -> Self {
        Self::Single {
            grain: Grain::Day,
            date_start: date.clone(),
            date_end: date,
        }
    }

    pub fn range(grain: Option<Grain>, start: String, end: String) -> Self {
        Self::Range {
            grain,
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn grain(&self) -> Option<Grain> {
        match self {
            Self::None => None,
            Self::Single { grain, .. } => Some(*grain),
            Self::Range { grain, .. } => *grain,
        }
    }
}
