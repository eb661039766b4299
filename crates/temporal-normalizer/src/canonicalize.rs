//! Date text canonicalization.
//!
//! Rewrites loosely formatted date substrings (`1-10`, `05.10.2025`, `t9/25`,
//! `thang 9`) into the controlled vocabulary `ngày D tháng M năm Y` that the
//! time-parsing service recognizes reliably. Pure and total: the worst case
//! is the input lowercased and trimmed.
//!
//! Day and month values are not range-checked here.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static BARE_THANG: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bthang\b").unwrap());
static BARE_NAM: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bnam\b").unwrap());
static DIGIT_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d)[-.](\d)").unwrap());
static SLASH_SPACING: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*/\s*").unwrap());
static WORD_THANG: Lazy<Regex> = Lazy::new(|| Regex::new(r"\btháng\b").unwrap());
static DAY_MONTH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})\b").unwrap());
static DAY_MONTH_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b").unwrap());
static ANY_FULL_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{1,2}/\d{1,2}/\d{2,4}").unwrap());
static MONTH_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{1,2})/(\d{2,4})\b").unwrap());
static ABBREV_MONTH_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bt\s*0*(\d{1,2})/(\d{2})\b").unwrap());
static REPEATED_NGAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bngày(?:\s+ngày)+\b").unwrap());
static REPEATED_THANG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\btháng(?:\s+tháng)+\b").unwrap());
static REPEATED_NAM: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bnăm(?:\s+năm)+\b").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Canonicalize free-form Vietnamese date text.
///
/// # Examples
///
/// ```
/// use temporal_normalizer::canonicalize::canonicalize;
///
/// assert_eq!(canonicalize("Xem lương ngày 1-10"), "xem lương ngày 1 tháng 10");
/// assert_eq!(canonicalize("công 05/10/2025"), "công ngày 5 tháng 10 năm 2025");
/// assert_eq!(canonicalize("lương t9/25"), "lương tháng 9 năm 2025");
/// ```
pub fn canonicalize(text: &str) -> String {
    let text = text.trim().to_lowercase();

    let text = BARE_THANG.replace_all(&text, "tháng");
    let text = BARE_NAM.replace_all(&text, "năm").into_owned();

    let text = unify_separators(&text);

    let text = if WORD_THANG.is_match(&text) {
        text
    } else {
        rewrite_day_month(&text)
    };

    let text = DAY_MONTH_YEAR
        .replace_all(&text, |caps: &Captures| {
            format!(
                "ngày {} tháng {} năm {}",
                strip_zeros(&caps[1]),
                strip_zeros(&caps[2]),
                &caps[3]
            )
        })
        .into_owned();

    let text = if ANY_FULL_DATE.is_match(&text) {
        text
    } else {
        MONTH_YEAR
            .replace_all(&text, |caps: &Captures| {
                format!("tháng {} năm {}", strip_zeros(&caps[1]), &caps[2])
            })
            .into_owned()
    };

    let text = ABBREV_MONTH_YEAR.replace_all(&text, |caps: &Captures| {
        format!("tháng {} năm 20{}", strip_zeros(&caps[1]), &caps[2])
    });

    tidy(&text)
}

/// `-` and `.` between digits become `/`; whitespace around `/` is dropped.
fn unify_separators(text: &str) -> String {
    let mut current = text.to_string();
    // Adjacent separators share digits ("1-2-2025"), so repeat until stable.
    loop {
        let next = DIGIT_SEPARATOR.replace_all(&current, "$1/$2").into_owned();
        if next == current {
            break;
        }
        current = next;
    }
    SLASH_SPACING.replace_all(&current, "/").into_owned()
}

/// Bare `D/M` → `ngày D tháng M`, leaving `D/M` that is part of a longer
/// slash chain (`1/10/2025`) for the full-date rule.
fn rewrite_day_month(text: &str) -> String {
    DAY_MONTH
        .replace_all(text, |caps: &Captures| {
            let whole = caps.get(0).map(|m| (m.start(), m.end()));
            let chained = whole.is_some_and(|(start, end)| {
                text[..start].ends_with('/') || text[end..].starts_with('/')
            });
            if chained {
                caps[0].to_string()
            } else {
                format!(
                    "ngày {} tháng {}",
                    strip_zeros(&caps[1]),
                    strip_zeros(&caps[2])
                )
            }
        })
        .into_owned()
}

/// Collapse lead words doubled by the rewrites ("ngày ngày 1 tháng 10") and
/// runs of whitespace.
fn tidy(text: &str) -> String {
    let text = REPEATED_NGAY.replace_all(text, "ngày");
    let text = REPEATED_THANG.replace_all(&text, "tháng");
    let text = REPEATED_NAM.replace_all(&text, "năm");
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

fn strip_zeros(digits: &str) -> String {
    digits
        .parse::<u32>()
        .map(|n| n.to_string())
        .unwrap_or_else(|_| digits.to_string())
}

// ── Tests ───────────────────────────────────────────────────────────────────
