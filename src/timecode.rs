use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::CaptionError;

// @module: SRT timecode conversion

// @const: Strict HH:MM:SS,mmm pattern
static TIMESTAMP_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2}):(\d{2}):(\d{2}),(\d{3})$").unwrap()
});

/// Parse an SRT timestamp (`HH:MM:SS,mmm`) into milliseconds.
///
/// Accepts exactly the fixed-width pattern: two-digit hours, minutes and
/// seconds, a comma, and three-digit milliseconds. Minutes and seconds
/// above 59 are rejected.
pub fn parse_timestamp(timestamp: &str) -> Result<u64, CaptionError> {
    let caps = TIMESTAMP_PATTERN
        .captures(timestamp)
        .ok_or_else(|| CaptionError::MalformedTimestamp(timestamp.to_string()))?;

    // The pattern guarantees each group is a short digit run
    let hours: u64 = caps[1].parse().unwrap();
    let minutes: u64 = caps[2].parse().unwrap();
    let seconds: u64 = caps[3].parse().unwrap();
    let millis: u64 = caps[4].parse().unwrap();

    if minutes >= 60 || seconds >= 60 {
        return Err(CaptionError::MalformedTimestamp(timestamp.to_string()));
    }

    Ok(hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis)
}

/// Format milliseconds as an SRT timestamp (`HH:MM:SS,mmm`).
///
/// Inverse of [`parse_timestamp`]: `format_timestamp(parse_timestamp(s)?) == s`
/// for every well-formed `s`.
pub fn format_timestamp(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}
