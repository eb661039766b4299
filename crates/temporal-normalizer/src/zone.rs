//! Fixed-offset timezone handling.
//!
//! Every instant the normalizer emits is expressed in one fixed UTC offset
//! (UTC+7 for Vietnam). Values coming back from the time-parsing service go
//! through [`to_local`], the single conversion routine; callers that must not
//! fail use [`convert_or_passthrough`].

use chrono::{
    DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, SecondsFormat, TimeZone, Utc,
};
use chrono_tz::Tz;

use crate::error::EngineError;

/// Seconds east of UTC for `Asia/Ho_Chi_Minh`.
pub const VN_OFFSET_SECS: i32 = 7 * 3600;

/// The default output offset (UTC+7).
pub fn vn_offset() -> FixedOffset {
    FixedOffset::east_opt(VN_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Resolve a timezone setting to the fixed offset in force at `at`.
///
/// Accepts either a literal offset (`"+07:00"`) or an IANA name
/// (`"Asia/Ho_Chi_Minh"`).
///
/// # Errors
///
/// Returns [`EngineError::InvalidTimezone`] if the value is neither.
pub fn resolve_offset(timezone: &str, at: DateTime<Utc>) -> Result<FixedOffset, EngineError> {
    let timezone = timezone.trim();
    if let Ok(offset) = timezone.parse::<FixedOffset>() {
        return Ok(offset);
    }
    let tz = timezone
        .parse::<Tz>()
        .map_err(|_| EngineError::InvalidTimezone(format!("'{}'", timezone)))?;
    Ok(tz.offset_from_utc_datetime(&at.naive_utc()).fix())
}

/// Parse an ISO 8601 instant and express it in `offset`.
///
/// Offset-aware input keeps its instant; naive input (with or without a
/// time part) is taken as UTC.
///
/// # Errors
///
/// Returns [`EngineError::InvalidDatetime`] if no supported layout matches.
pub fn to_local(iso: &str, offset: &FixedOffset) -> Result<DateTime<FixedOffset>, EngineError> {
    let s = iso.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(offset));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Ok(dt.with_timezone(offset));
    }
    for layout in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, layout) {
            return Ok(Utc.from_utc_datetime(&naive).with_timezone(offset));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&naive).with_timezone(offset));
        }
    }
    Err(EngineError::InvalidDatetime(format!("'{}'", iso)))
}

/// An external value after conversion: either a local instant or the raw
/// string, kept when conversion failed.
#[derive(Debug, Clone, PartialEq)]
pub enum Converted {
    Local(DateTime<FixedOffset>),
    Raw(String),
}

impl Converted {
    pub fn local(&self) -> Option<DateTime<FixedOffset>> {
        match self {
            Self::Local(dt) => Some(*dt),
            Self::Raw(_) => None,
        }
    }

    pub fn to_iso(&self) -> String {
        match self {
            Self::Local(dt) => format_iso(dt),
            Self::Raw(s) => s.clone(),
        }
    }
}

/// [`to_local`] that logs a failure and hands the input back unconverted.
pub fn convert_or_passthrough(iso: &str, offset: &FixedOffset) -> Converted {
    match to_local(iso, offset) {
        Ok(dt) => Converted::Local(dt),
        Err(err) => {
            tracing::warn!(value = iso, error = %err, "timezone conversion failed, passing value through");
            Converted::Raw(iso.to_string())
        }
    }
}

/// Format as ISO 8601 with offset; fractional seconds only when non-zero.
pub fn format_iso(dt: &DateTime<FixedOffset>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

// ── Tests ───────────────────────────────────────────────────────────────────
