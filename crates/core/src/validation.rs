//! Input validation and sanitisation.
//!
//! Free text that ends up in the store (appointment notes, review comments) has markup removed
//! and HTML special characters escaped before it is written. Dates and times are normalised to
//! the formats the store uses.

use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use std::sync::LazyLock;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*(>|$)").expect("tag pattern is valid"));

/// Remove markup tags, then escape `& < > " '`.
pub fn sanitize_text(input: &str) -> String {
    let stripped = TAG.replace_all(input, "");
    let mut out = String::with_capacity(stripped.len());
    for c in stripped.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            c => out.push(c),
        }
    }
    out
}

/// Sanitised optional free text; absent or blank becomes the empty string.
pub fn sanitize_optional(input: Option<&str>) -> String {
    match input {
        Some(text) if !text.trim().is_empty() => sanitize_text(text),
        _ => String::new(),
    }
}

/// Parse a calendar date in `YYYY-MM-DD` form.
pub fn parse_date(input: &str) -> CoreResult<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT)
        .map_err(|_| CoreError::validation("Invalid date. Use YYYY-MM-DD."))
}

/// Parse a time of day in `HH:MM` or `HH:MM:SS` form.
pub fn parse_time(input: &str) -> CoreResult<NaiveTime> {
    let input = input.trim();
    NaiveTime::parse_from_str(input, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(input, "%H:%M"))
        .map_err(|_| CoreError::validation("Invalid time. Use HH:MM or HH:MM:SS."))
}

/// Parse a call schedule timestamp.
///
/// Accepts `YYYY-MM-DD HH:MM[:SS]`, the same with a `T` separator, and RFC 3339 with an offset
/// (converted to UTC).
pub fn parse_scheduled_at(input: &str) -> CoreResult<NaiveDateTime> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.naive_utc());
    }

    for format in [
        TIMESTAMP_FORMAT,
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(dt);
        }
    }

    Err(CoreError::validation(
        "Invalid scheduled_at. Use YYYY-MM-DD HH:MM:SS.",
    ))
}

/// A prediction confidence must be a finite fraction in `[0, 1]`.
pub fn validate_confidence(score: f64) -> CoreResult<f64> {
    if score.is_finite() && (0.0..=1.0).contains(&score) {
        Ok(score)
    } else {
        Err(CoreError::validation(
            "confidence_score must be between 0 and 1",
        ))
    }
}

/// Loose email shape check: one `@` with text on both sides and a dot in the domain.
///
/// Returns the address lower-cased; accounts are matched case-insensitively.
pub fn validate_email(input: &str) -> CoreResult<String> {
    let email = input.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if valid {
        Ok(email.to_lowercase())
    } else {
        Err(CoreError::validation("Invalid email address."))
    }
}
