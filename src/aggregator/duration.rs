//! Polling period parsing
//!
//! Accepts one or more `<integer><unit>` components with units `h`, `m`,
//! `s` and `ms`, optionally separated by whitespace: `1h30m`, `1h 30m 15s`,
//! `45s`, `3500ms`.

use std::time::Duration;
use thiserror::Error;

/// A polling period that could not be parsed or is not positive
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid duration '{input}': {reason} (use a format like 1h 30m 15s or 3500ms)")]
pub struct InvalidDuration {
    pub input: String,
    pub reason: String,
}

impl InvalidDuration {
    pub(crate) fn new(input: &str, reason: impl Into<String>) -> Self {
        Self {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// Parses a human-readable period into a positive [`Duration`]
///
/// # Example
///
/// ```
/// use gator::aggregator::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
/// assert!(parse_duration("0s").is_err());
/// ```
pub fn parse_duration(input: &str) -> Result<Duration, InvalidDuration> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(InvalidDuration::new(input, "empty duration"));
    }

    let mut total_ms: u64 = 0;
    let mut rest = trimmed;

    while !rest.is_empty() {
        let digits_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if digits_end == 0 {
            return Err(InvalidDuration::new(input, "expected a number"));
        }

        let value: u64 = rest[..digits_end]
            .parse()
            .map_err(|_| InvalidDuration::new(input, "number too large"))?;
        rest = &rest[digits_end..];

        let unit_end = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        let unit = &rest[..unit_end];
        rest = rest[unit_end..].trim_start();

        let millis_per_unit = match unit {
            "h" => 3_600_000,
            "m" => 60_000,
            "s" => 1_000,
            "ms" => 1,
            "" => return Err(InvalidDuration::new(input, "missing unit")),
            other => {
                return Err(InvalidDuration::new(
                    input,
                    format!("unknown unit '{}'", other),
                ))
            }
        };

        total_ms = value
            .checked_mul(millis_per_unit)
            .and_then(|ms| total_ms.checked_add(ms))
            .ok_or_else(|| InvalidDuration::new(input, "duration too large"))?;
    }

    if total_ms == 0 {
        return Err(InvalidDuration::new(input, "duration must be positive"));
    }

    Ok(Duration::from_millis(total_ms))
}
