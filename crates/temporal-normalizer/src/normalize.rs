//! Response normalization.
//!
//! Reconciles the time service's candidates with the source text into one
//! [`NormalizedTimeResult`]. Rules are tried in order and the first match
//! wins:
//!
//! 1. relative-day keywords (`hôm nay`, `ngày mai`, `hôm qua`)
//! 2. a `D/M[/Y] đến D/M[/Y]` range written in the source text
//! 3. a single `D/M[/Y]` written in the source text
//! 4. two or more candidates: first is the start, last is the end
//! 5. no candidates: `none`
//! 6. the first `time` candidate: interval, widened value, or single day
//!
//! Missing years default to the reference year. Range endpoints are always
//! ordered.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::candidate::{RawCandidate, TimeValue};
use crate::error::EngineError;
use crate::grain::{expand, expand_iso, shift_if_early, Grain};
use crate::result::NormalizedTimeResult;
use crate::settings::NormalizerSettings;
use crate::zone::{self, convert_or_passthrough, format_iso, Converted};

static TODAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bhôm nay\b").unwrap());
static TOMORROW: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bngày mai\b").unwrap());
static YESTERDAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bhôm qua\b").unwrap());
static EXPLICIT_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:ngày\s*)?\b(\d{1,2}[/-]\d{1,2}(?:[/-]\d{4})?)\s*(?:đến|tới|->|→|-)\s*(?:ngày\s*)?\b(\d{1,2}[/-]\d{1,2}(?:[/-]\d{4})?)\b",
    )
    .unwrap()
});
static EXPLICIT_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})[/-](\d{1,2})(?:[/-](\d{4}))?\b").unwrap());
static YEAR_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{4}\b").unwrap());

/// Knobs for a [`Normalizer`].
#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    /// Offset every output instant is expressed in.
    pub offset: FixedOffset,
    /// Widen single values to the last second of their period (vs. the next
    /// period's first instant).
    pub inclusive_end: bool,
    /// Move service instants before 03:00 local time to the next day before
    /// widening them.
    pub shift_early_hours: bool,
    /// Pull a single date that lands after the reference day back one year
    /// when the source text names no year.
    pub pull_future_single_back: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            offset: zone::vn_offset(),
            inclusive_end: true,
            shift_early_hours: false,
            pull_future_single_back: false,
        }
    }
}

/// Stateless reconciler; one instance can serve any number of calls.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    options: NormalizeOptions,
}

impl Normalizer {
    pub fn new(options: NormalizeOptions) -> Self {
        Self { options }
    }

    /// Build from settings, resolving the configured timezone as of now.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidTimezone`] for an unknown timezone.
    pub fn from_settings(settings: &NormalizerSettings) -> Result<Self, EngineError> {
        let offset = zone::resolve_offset(&settings.timezone, Utc::now())?;
        Ok(Self::new(NormalizeOptions {
            offset,
            inclusive_end: settings.inclusive_end,
            shift_early_hours: settings.shift_early_hours,
            pull_future_single_back: settings.pull_future_single_back,
        }))
    }

    pub fn options(&self) -> &NormalizeOptions {
        &self.options
    }

    /// Wall-clock now in the configured offset.
    pub fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.options.offset)
    }

    /// Reduce `candidates` and `source_text` to one result. Never fails.
    pub fn normalize(
        &self,
        candidates: &[RawCandidate],
        source_text: &str,
        reference: DateTime<FixedOffset>,
    ) -> NormalizedTimeResult {
        let text = source_text.trim().to_lowercase();
        let reference = reference.with_timezone(&self.options.offset);
        let Some(today) = self.midnight(reference.date_naive()) else {
            return NormalizedTimeResult::None;
        };
        let has_year = YEAR_TOKEN.is_match(&text);

        if let Some(result) = self.relative_day(&text, today) {
            tracing::debug!(rule = "relative_day", "time normalized");
            return result;
        }
        if let Some(result) = self.explicit_range(&text, today.year()) {
            tracing::debug!(rule = "explicit_range", "time normalized");
            return result;
        }
        if let Some(result) = self.explicit_date(&text, today) {
            tracing::debug!(rule = "explicit_date", "time normalized");
            return result;
        }
        if candidates.len() >= 2 {
            if let Some(result) = self.candidate_span(candidates, has_year, today.year()) {
                tracing::debug!(rule = "candidate_span", count = candidates.len(), "time normalized");
                return result;
            }
        }
        if candidates.is_empty() {
            tracing::debug!(rule = "no_candidates", "time normalized");
            return NormalizedTimeResult::None;
        }
        tracing::debug!(rule = "primary_candidate", "time normalized");
        self.primary_candidate(candidates, has_year, today)
    }

    fn relative_day(&self, text: &str, today: DateTime<FixedOffset>) -> Option<NormalizedTimeResult> {
        let day = if TODAY.is_match(text) {
            today
        } else if TOMORROW.is_match(text) {
            self.shift_days(today, 1)?
        } else if YESTERDAY.is_match(text) {
            self.shift_days(today, -1)?
        } else {
            return None;
        };
        Some(NormalizedTimeResult::single_day(format_iso(&day)))
    }

    fn explicit_range(&self, text: &str, default_year: i32) -> Option<NormalizedTimeResult> {
        EXPLICIT_RANGE.captures_iter(text).find_map(|caps| {
            let start = parse_day_month(&caps[1], default_year)?;
            let end = parse_day_month(&caps[2], default_year)?;
            let (start, end) = if end < start { (end, start) } else { (start, end) };
            let start = self.midnight(start)?;
            let end = self.midnight(end)? + Duration::days(1) - Duration::seconds(1);
            Some(NormalizedTimeResult::range(
                Some(Grain::Day),
                format_iso(&start),
                format_iso(&end),
            ))
        })
    }

    fn explicit_date(&self, text: &str, today: DateTime<FixedOffset>) -> Option<NormalizedTimeResult> {
        EXPLICIT_DATE.captures_iter(text).find_map(|caps| {
            let day: u32 = caps[1].parse().ok()?;
            let month: u32 = caps[2].parse().ok()?;
            let explicit_year = caps.get(3).and_then(|y| y.as_str().parse::<i32>().ok());
            let date = NaiveDate::from_ymd_opt(explicit_year.unwrap_or(today.year()), month, day)?;
            let mut dt = self.midnight(date)?;
            if explicit_year.is_none() {
                dt = self.pull_back_if_future(dt, today);
            }
            Some(NormalizedTimeResult::single_day(format_iso(&dt)))
        })
    }

    /// First candidate opens the range, last candidate closes it.
    ///
    /// Years are settled on the raw instants before widening, so a month end
    /// is computed in the year it lands in. A reversed pair is reordered
    /// first: the earlier instant opens the range and the later one closes it.
    fn candidate_span(
        &self,
        candidates: &[RawCandidate],
        has_year: bool,
        reference_year: i32,
    ) -> Option<NormalizedTimeResult> {
        let (first_value, first_grain) = candidates.first()?.instant_value()?;
        let (last_value, last_grain) = candidates.last()?.instant_value()?;
        let first_grain = first_grain.unwrap_or(Grain::Day);
        let last_grain = last_grain.unwrap_or(Grain::Day);

        let mut first = self.service_instant(&first_value)?;
        let mut last = self.service_instant(&last_value)?;

        if !has_year {
            first = with_year_clamped(first, reference_year)?;
            let last_year = if last.month() < first.month() {
                reference_year + 1
            } else {
                reference_year
            };
            last = with_year_clamped(last, last_year)?;
        }

        let ((opening, opening_grain), (closing, closing_grain)) = if last < first {
            ((last, last_grain), (first, first_grain))
        } else {
            ((first, first_grain), (last, last_grain))
        };
        let (start, _) = expand(opening, opening_grain, false);
        let (_, end) = expand(closing, closing_grain, true);

        Some(NormalizedTimeResult::range(
            Some(last_grain),
            format_iso(&start),
            format_iso(&end),
        ))
    }

    /// A service value in the output offset, early-hour shifted when enabled.
    fn service_instant(&self, value: &str) -> Option<DateTime<FixedOffset>> {
        let local = convert_or_passthrough(value, &self.options.offset).local()?;
        Some(if self.options.shift_early_hours {
            shift_if_early(local)
        } else {
            local
        })
    }

    fn primary_candidate(
        &self,
        candidates: &[RawCandidate],
        has_year: bool,
        today: DateTime<FixedOffset>,
    ) -> NormalizedTimeResult {
        let Some(item) = candidates
            .iter()
            .find(|c| c.is_time())
            .or_else(|| candidates.first())
        else {
            return NormalizedTimeResult::None;
        };
        let Some(value) = item.time_value() else {
            tracing::debug!(body = ?item.body, "unusable time candidate");
            return NormalizedTimeResult::None;
        };
        let grain = value.grain();

        match value {
            TimeValue::Interval { from, to, .. } => {
                let offset = &self.options.offset;
                let mut start = from.map(|e| convert_or_passthrough(&e.value, offset));
                let mut end = to.map(|e| convert_or_passthrough(&e.value, offset));
                let reversed = match (&start, &end) {
                    (Some(Converted::Local(s)), Some(Converted::Local(e))) => e < s,
                    _ => false,
                };
                if reversed {
                    std::mem::swap(&mut start, &mut end);
                }
                NormalizedTimeResult::Range {
                    grain,
                    start: start.map(|c| c.to_iso()),
                    end: end.map(|c| c.to_iso()),
                }
            }
            TimeValue::Value { value, .. } => match grain {
                Some(g) if g.is_multi_day() => {
                    let (start, end) = self.expand(&value, g, self.options.inclusive_end);
                    NormalizedTimeResult::range(Some(g), start.to_iso(), end.to_iso())
                }
                _ => {
                    let (start, _) = self.expand(&value, Grain::Day, self.options.inclusive_end);
                    let start = match start {
                        Converted::Local(dt) if !has_year => {
                            Converted::Local(self.pull_back_if_future(dt, today))
                        }
                        other => other,
                    };
                    NormalizedTimeResult::single_day(start.to_iso())
                }
            },
        }
    }

    fn expand(&self, value: &str, grain: Grain, inclusive_end: bool) -> (Converted, Converted) {
        expand_iso(
            value,
            Some(grain),
            inclusive_end,
            &self.options.offset,
            self.options.shift_early_hours,
        )
    }

    fn pull_back_if_future(
        &self,
        dt: DateTime<FixedOffset>,
        today: DateTime<FixedOffset>,
    ) -> DateTime<FixedOffset> {
        if self.options.pull_future_single_back && dt > today {
            with_year_clamped(dt, dt.year() - 1).unwrap_or(dt)
        } else {
            dt
        }
    }

    fn midnight(&self, date: NaiveDate) -> Option<DateTime<FixedOffset>> {
        let naive = date.and_hms_opt(0, 0, 0)?;
        self.options.offset.from_local_datetime(&naive).single()
    }

    fn shift_days(&self, day: DateTime<FixedOffset>, days: i64) -> Option<DateTime<FixedOffset>> {
        self.midnight(day.date_naive() + Duration::days(days))
    }
}

/// Normalize with default options (UTC+7, inclusive ends, toggles off).
pub fn normalize(
    candidates: &[RawCandidate],
    source_text: &str,
    reference: DateTime<FixedOffset>,
) -> NormalizedTimeResult {
    Normalizer::default().normalize(candidates, source_text, reference)
}

/// Parse `D/M` or `D/M/YYYY` (`-` also accepted).
fn parse_day_month(s: &str, default_year: i32) -> Option<NaiveDate> {
    let parts: Vec<&str> = s.split(['/', '-']).collect();
    let (day, month, year) = match parts.as_slice() {
        [d, m] => (d.parse().ok()?, m.parse().ok()?, default_year),
        [d, m, y] => (d.parse().ok()?, m.parse().ok()?, y.parse().ok()?),
        _ => return None,
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Replace the year, clamping Feb 29 to Feb 28 when the target year is not
/// a leap year.
fn with_year_clamped(dt: DateTime<FixedOffset>, year: i32) -> Option<DateTime<FixedOffset>> {
    dt.with_year(year)
        .or_else(|| dt.with_day(28).and_then(|d| d.with_year(year)))
}

// ── Tests ───────────────────────────────────────────────────────────────────
