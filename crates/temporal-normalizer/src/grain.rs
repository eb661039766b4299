//! Grain interval expansion.
//!
//! Widens one instant into the calendar period of its grain, computed in a
//! fixed UTC offset. Weeks are anchored to the given day (no weekday
//! realignment). With `inclusive_end` the end is the last second of the
//! period; otherwise it is the first instant of the next period.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, FixedOffset, Months, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use crate::zone::{self, Converted};

/// Coarseness of a resolved time value, ordered finest to coarsest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grain {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl Grain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Second => "second",
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Year => "year",
        }
    }

    /// Week and coarser: grains that widen a value into a `range`.
    pub fn is_multi_day(&self) -> bool {
        *self >= Self::Week
    }

    /// Lenient parse of a service-reported grain; unknown strings yield `None`.
    pub fn parse_lenient(s: Option<&str>) -> Option<Self> {
        s.and_then(|g| g.parse().ok())
    }
}

impl fmt::Display for Grain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Grain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "second" => Ok(Self::Second),
            "minute" => Ok(Self::Minute),
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "quarter" => Ok(Self::Quarter),
            "year" => Ok(Self::Year),
            other => Err(format!("unknown grain '{other}'")),
        }
    }
}

/// Expand `instant` to the `(start, end)` of its grain period in `instant`'s offset.
///
/// Sub-day grains return `(instant, instant)`.
///
/// # Examples
///
/// ```
/// use chrono::DateTime;
/// use temporal_normalizer::grain::{expand, Grain};
///
/// let t = DateTime::parse_from_rfc3339("2025-02-10T09:30:00+07:00").unwrap();
/// let (start, end) = expand(t, Grain::Quarter, true);
/// assert_eq!(start.to_rfc3339(), "2025-01-01T00:00:00+07:00");
/// assert_eq!(end.to_rfc3339(), "2025-03-31T23:59:59+07:00");
/// ```
pub fn expand(
    instant: DateTime<FixedOffset>,
    grain: Grain,
    inclusive_end: bool,
) -> (DateTime<FixedOffset>, DateTime<FixedOffset>) {
    let offset = *instant.offset();
    let date = instant.date_naive();

    let bounds = match grain {
        Grain::Day => Some((date, date + Duration::days(1))),
        Grain::Week => Some((date, date + Duration::days(7))),
        Grain::Month => first_of(date.year(), date.month())
            .and_then(|start| Some((start, start.checked_add_months(Months::new(1))?))),
        Grain::Quarter => {
            let q_start_month = ((date.month() - 1) / 3) * 3 + 1;
            first_of(date.year(), q_start_month)
                .and_then(|start| Some((start, start.checked_add_months(Months::new(3))?)))
        }
        Grain::Year => first_of(date.year(), 1)
            .and_then(|start| Some((start, first_of(date.year() + 1, 1)?))),
        Grain::Second | Grain::Minute | Grain::Hour => None,
    };

    let Some((start_date, end_date)) = bounds else {
        return (instant, instant);
    };
    let (Some(start), Some(end)) = (midnight(start_date, &offset), midnight(end_date, &offset))
    else {
        return (instant, instant);
    };

    let end = if inclusive_end {
        end - Duration::seconds(1)
    } else {
        end
    };
    (start, end)
}

/// Expand an ISO string received from the time service.
///
/// The value goes through [`zone::convert_or_passthrough`]; a value that
/// cannot be converted comes back unchanged as both bounds. With
/// `shift_early_hours`, an instant before 03:00 local time is moved to the
/// following day before widening.
pub fn expand_iso(
    value: &str,
    grain: Option<Grain>,
    inclusive_end: bool,
    offset: &FixedOffset,
    shift_early_hours: bool,
) -> (Converted, Converted) {
    let local = match zone::convert_or_passthrough(value, offset) {
        Converted::Local(dt) => dt,
        raw @ Converted::Raw(_) => return (raw.clone(), raw),
    };
    let base = if shift_early_hours {
        shift_if_early(local)
    } else {
        local
    };
    let Some(grain) = grain else {
        return (Converted::Local(base), Converted::Local(base));
    };
    let (start, end) = expand(base, grain, inclusive_end);
    (Converted::Local(start), Converted::Local(end))
}

/// Move instants before 03:00 local time one day forward.
pub fn shift_if_early(dt: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    use chrono::Timelike;
    if dt.hour() < 3 {
        dt + Duration::days(1)
    } else {
        dt
    }
}

fn first_of(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

fn midnight(date: NaiveDate, offset: &FixedOffset) -> Option<DateTime<FixedOffset>> {
    let naive = date.and_hms_opt(0, 0, 0)?;
    offset.from_local_datetime(&naive).single()
}

// ── Tests ───────────────────────────────────────────────────────────────────
