//! Best-effort field parsers. None of these fail: unparseable input yields an
//! explicit no-match value or a sentinel, never an error.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use jobagg_core::{DEFAULT_CURRENCY, UNKNOWN_CITY, UNKNOWN_STATE};
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde_json::Value as JsonValue;

pub const MAX_SKILLS: usize = 20;
pub const MAX_SKILL_LEN: usize = 100;
pub const DERIVED_ID_LEN: usize = 16;

const REMOTE_MARKERS: [&str; 4] = ["remote", "anywhere", "work from home", "wfh"];

lazy_static! {
    // "$80k-$120k USD", "$80,000 - $120,000", "80k-$120k", "80000-120000", "80K-120K EUR"
    static ref SALARY_RANGE_REGEX: Regex = Regex::new(
        r"(?i)^\s*\$?\s*(\d[\d,]*(?:\.\d+)?)\s*(k)?\s*[-–]\s*\$?\s*(\d[\d,]*(?:\.\d+)?)\s*(k)?\s*([a-z]{3})?\s*$"
    ).unwrap();
}

#[derive(Debug, Clone, PartialEq)]
pub enum SalaryParse {
    Range {
        min: f64,
        max: f64,
        currency: String,
    },
    NoMatch,
}

impl SalaryParse {
    /// Bounds as stored on a listing: zero bounds count as absent, and a
    /// missing match means no bounds in the default currency.
    pub fn into_bounds(self) -> (Option<f64>, Option<f64>, String) {
        match self {
            SalaryParse::Range { min, max, currency } => {
                (positive(min), positive(max), currency)
            }
            SalaryParse::NoMatch => (None, None, DEFAULT_CURRENCY.to_string()),
        }
    }
}

pub fn positive(value: f64) -> Option<f64> {
    if value > 0.0 {
        Some(value)
    } else {
        None
    }
}

pub fn parse_salary_range(text: &str) -> SalaryParse {
    SALARY_RANGE_REGEX
        .captures(text)
        .and_then(|caps| salary_from_captures(&caps))
        .unwrap_or(SalaryParse::NoMatch)
}

fn salary_from_captures(caps: &Captures<'_>) -> Option<SalaryParse> {
    let min = salary_amount(caps.get(1)?.as_str(), caps.get(2).is_some())?;
    let max = salary_amount(caps.get(3)?.as_str(), caps.get(4).is_some())?;
    let currency = caps
        .get(5)
        .map(|m| m.as_str().to_ascii_uppercase())
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
    Some(SalaryParse::Range { min, max, currency })
}

fn salary_amount(digits: &str, thousands: bool) -> Option<f64> {
    let value: f64 = digits.replace(',', "").parse().ok()?;
    Some(if thousands { value * 1000.0 } else { value })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub city: String,
    pub state: String,
}

impl Location {
    /// Replace tokens that are exactly a remote marker ("Remote", "WFH")
    /// with the unknown sentinels; they name no place. Tokens that merely
    /// contain a marker ("IL (WFH)") are kept.
    pub fn without_remote_markers(self) -> Self {
        let scrub = |part: String, sentinel: &str| {
            if is_remote_marker(&part) {
                sentinel.to_string()
            } else {
                part
            }
        };
        Self {
            city: scrub(self.city, UNKNOWN_CITY),
            state: scrub(self.state, UNKNOWN_STATE),
        }
    }
}

/// Split free-text "City, State". Tokens past the second are ignored.
pub fn parse_location(text: &str) -> Location {
    let mut parts = text.split(',').map(str::trim);
    let city = parts
        .next()
        .filter(|p| !p.is_empty())
        .unwrap_or(UNKNOWN_CITY)
        .to_string();
    let state = parts
        .next()
        .filter(|p| !p.is_empty())
        .unwrap_or(UNKNOWN_STATE)
        .to_string();
    Location { city, state }
}

fn is_remote_marker(token: &str) -> bool {
    let token = token.trim().to_lowercase();
    REMOTE_MARKERS.contains(&token.as_str())
}

pub fn is_remote_location(text: &str) -> bool {
    let lower = text.to_lowercase();
    REMOTE_MARKERS.iter().any(|marker| lower.contains(marker))
}

pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_rfc2822(text) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Posted date, falling back to the ingestion time when absent or unparseable.
pub fn parse_posted_date(text: Option<&str>, fetched_at: DateTime<Utc>) -> DateTime<Utc> {
    text.and_then(parse_timestamp).unwrap_or(fetched_at)
}

/// Keep string entries only, trimmed, non-empty, at most [`MAX_SKILL_LEN`]
/// characters, capped at [`MAX_SKILLS`] in source order. No case folding or
/// dedup happens here.
pub fn sanitize_skills(raw: &[JsonValue]) -> Vec<String> {
    raw.iter()
        .filter_map(JsonValue::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty() && s.chars().count() <= MAX_SKILL_LEN)
        .take(MAX_SKILLS)
        .map(ToString::to_string)
        .collect()
}

/// Identity for sources without an id field: the first 16 characters of the
/// standard base64 encoding of `"<position>_<company>_<posted>"`.
///
/// This is the dedup key of every stored record from such a source. Changing
/// the separator, the encoding or the length re-admits all of them as new.
pub fn derive_content_id(position: &str, company: &str, posted: &str) -> String {
    let content = format!("{position}_{company}_{posted}");
    let mut encoded = STANDARD.encode(content.as_bytes());
    encoded.truncate(DERIVED_ID_LEN);
    encoded
}

/// Trimmed value, or `sentinel` when missing or blank.
pub fn text_or(value: Option<&str>, sentinel: &str) -> String {
    non_blank(value).unwrap_or_else(|| sentinel.to_string())
}

pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}
