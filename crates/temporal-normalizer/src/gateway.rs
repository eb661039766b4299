//! Time service gateway.
//!
//! Sends canonicalized text to a Duckling-compatible time-parsing service and
//! returns its candidate annotations. Transport failures, timeouts, non-2xx
//! statuses and undecodable bodies never reach the caller as errors: they
//! yield an empty candidate list, with the cause kept in
//! [`ParseOutcome::failure`].

use std::time::Duration;

use chrono::{DateTime, FixedOffset, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::canonicalize::canonicalize;
use crate::candidate::{decode_candidates, RawCandidate};
use crate::error::EngineError;
use crate::settings::DucklingSettings;
use crate::zone::vn_offset;

static SLASH_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{1,2}[/-]\d{1,2}(?:[/-]\d{2,4})?\b").unwrap());
static MONTH_SLASH_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{1,2}/\d{4}\b").unwrap());
static FOUR_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{4}\b").unwrap());

/// Candidates from one parse call, plus the failure that emptied them, if any.
#[derive(Debug, Default)]
pub struct ParseOutcome {
    pub candidates: Vec<RawCandidate>,
    pub failure: Option<EngineError>,
}

impl ParseOutcome {
    pub fn ok(candidates: Vec<RawCandidate>) -> Self {
        Self {
            candidates,
            failure: None,
        }
    }

    pub fn failed(failure: EngineError) -> Self {
        Self {
            candidates: Vec::new(),
            failure: Some(failure),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.failure.is_none()
    }
}

/// Anything that turns text into time candidates.
pub trait TimeParser: Send + Sync {
    /// Parse `text` relative to `reference`. Never fails.
    fn parse(&self, text: &str, reference: DateTime<FixedOffset>) -> ParseOutcome;
}

/// A parser that answers with a fixed candidate list, for offline use.
#[derive(Debug, Clone, Default)]
pub struct StaticParser {
    candidates: Vec<RawCandidate>,
}

impl StaticParser {
    pub fn new(candidates: Vec<RawCandidate>) -> Self {
        Self { candidates }
    }
}

impl TimeParser for StaticParser {
    fn parse(&self, _text: &str, _reference: DateTime<FixedOffset>) -> ParseOutcome {
        ParseOutcome::ok(self.candidates.clone())
    }
}

/// Blocking HTTP client for a Duckling `/parse` endpoint.
///
/// The inner client pools connections and is safe to share across threads.
#[derive(Debug, Clone)]
pub struct DucklingGateway {
    settings: DucklingSettings,
    client: reqwest::blocking::Client,
}

impl DucklingGateway {
    /// Build a gateway with the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Transport`] if the HTTP client cannot be built.
    pub fn new(settings: DucklingSettings) -> Result<Self, EngineError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()
            .map_err(|e| EngineError::Transport(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &DucklingSettings {
        &self.settings
    }

    /// Parse with wall-clock now in UTC+7 as the reference.
    pub fn parse_now(&self, text: &str) -> ParseOutcome {
        self.parse(text, Utc::now().with_timezone(&vn_offset()))
    }

    /// The fallible call underneath [`TimeParser::parse`].
    ///
    /// # Errors
    ///
    /// [`EngineError::Transport`] on connection failure or timeout,
    /// [`EngineError::Status`] on a non-2xx answer and
    /// [`EngineError::Decode`] when the body is not a JSON array.
    pub fn try_parse(
        &self,
        text: &str,
        reference: DateTime<FixedOffset>,
    ) -> Result<Vec<RawCandidate>, EngineError> {
        let prepared = canonicalize(&apply_lead_in_hints(text));
        let reftime = reference.timestamp_millis().to_string();
        tracing::debug!(url = %self.settings.url, text = %prepared, reftime = %reftime, "time service request");

        let form = [
            ("locale", self.settings.locale.as_str()),
            ("text", prepared.as_str()),
            ("dims", r#"["time"]"#),
            ("reftime", reftime.as_str()),
        ];
        let response = self
            .client
            .post(&self.settings.url)
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded; charset=UTF-8",
            )
            .form(&form)
            .send()
            .map_err(|e| EngineError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .map_err(|e| EngineError::Transport(e.to_string()))?;
        decode_candidates(&body).map_err(|e| EngineError::Decode(e.to_string()))
    }
}

impl TimeParser for DucklingGateway {
    fn parse(&self, text: &str, reference: DateTime<FixedOffset>) -> ParseOutcome {
        match self.try_parse(text, reference) {
            Ok(candidates) => ParseOutcome::ok(candidates),
            Err(err) => {
                tracing::warn!(error = %err, url = %self.settings.url, "time service unavailable, treating as no time information");
                ParseOutcome::failed(err)
            }
        }
    }
}

/// Prefix lead-in words so a bare numeric token reads as a date rather than
/// a fraction or a count.
///
/// - a `D/M[/Y]` token without a leading `ngày` gets `ngày `
/// - a `M/YYYY` token with no `tháng` anywhere gets `tháng `
/// - a bare 4-digit number with no `/` and no `năm` gets `năm `
pub fn apply_lead_in_hints(text: &str) -> String {
    let mut text = text.trim().to_lowercase();

    if SLASH_DATE.is_match(&text) && !text.starts_with("ngày") {
        text = format!("ngày {text}");
    }
    if MONTH_SLASH_YEAR.is_match(&text) && !text.contains("tháng") {
        text = format!("tháng {text}");
    }
    if FOUR_DIGITS.is_match(&text) && !text.contains('/') && !text.contains("năm") {
        text = format!("năm {text}");
    }
    text
}

// ── Tests ───────────────────────────────────────────────────────────────────
