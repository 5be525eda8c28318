//! Duration text codec.
//!
//! Cycle configurations and checkpoints carry durations in the compact
//! `1h2m3.5s` notation (`"1m0s"`, `"500ms"`, `"30m0s"`). This module parses and
//! renders that notation and provides serde helpers for `Duration` fields.

use std::time::Duration;

use super::ValidationError;

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SEC: u128 = 1_000_000_000;
const NANOS_PER_MIN: u128 = 60 * NANOS_PER_SEC;
const NANOS_PER_HOUR: u128 = 60 * NANOS_PER_MIN;

/// Renders a duration in `h/m/s` notation.
///
/// Whole-second durations render with every lower unit present
/// (`60s` → `"1m0s"`); sub-second durations use the largest fitting unit
/// (`"500ms"`, `"1.5µs"`).
pub fn format_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }

    if nanos < NANOS_PER_SEC {
        return if nanos < NANOS_PER_MICRO {
            format!("{}ns", nanos)
        } else if nanos < NANOS_PER_MILLI {
            format!("{}µs", fractional(nanos, NANOS_PER_MICRO))
        } else {
            format!("{}ms", fractional(nanos, NANOS_PER_MILLI))
        };
    }

    let hours = nanos / NANOS_PER_HOUR;
    let minutes = (nanos % NANOS_PER_HOUR) / NANOS_PER_MIN;
    let seconds = fractional(nanos % NANOS_PER_MIN, NANOS_PER_SEC);

    if hours > 0 {
        format!("{}h{}m{}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m{}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

fn fractional(value: u128, unit: u128) -> String {
    let whole = value / unit;
    let rest = value % unit;
    if rest == 0 {
        return whole.to_string();
    }
    let width = (unit as f64).log10().round() as usize;
    let digits = format!("{:0width$}", rest, width = width);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}

/// Parses a duration in `h/m/s` notation.
///
/// Accepts any sequence of `<decimal><unit>` pairs with units `h`, `m`, `s`,
/// `ms`, `us`, `µs` and `ns`; the bare string `"0"` is also accepted.
pub fn parse_duration(field: &str, text: &str) -> Result<Duration, ValidationError> {
    let input = text.trim();
    if input.is_empty() {
        return Err(ValidationError::empty_field(field));
    }
    if input == "0" {
        return Ok(Duration::ZERO);
    }

    let mut total: u128 = 0;
    let mut rest = input;

    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| ValidationError::invalid_format(field, format!("missing unit in {:?}", text)))?;
        if number_len == 0 {
            return Err(ValidationError::invalid_format(
                field,
                format!("expected a number in {:?}", text),
            ));
        }
        let (number, tail) = rest.split_at(number_len);

        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);

        let scale = match unit {
            "ns" => 1,
            "us" | "µs" | "μs" => NANOS_PER_MICRO,
            "ms" => NANOS_PER_MILLI,
            "s" => NANOS_PER_SEC,
            "m" => NANOS_PER_MIN,
            "h" => NANOS_PER_HOUR,
            other => {
                return Err(ValidationError::invalid_format(
                    field,
                    format!("unknown unit {:?} in {:?}", other, text),
                ))
            }
        };

        total = total
            .checked_add(scaled(field, text, number, scale)?)
            .ok_or_else(|| ValidationError::out_of_range(field, format!("{:?} overflows", text)))?;
        rest = tail;
    }

    let secs = u64::try_from(total / NANOS_PER_SEC)
        .map_err(|_| ValidationError::out_of_range(field, format!("{:?} overflows", text)))?;
    Ok(Duration::new(secs, (total % NANOS_PER_SEC) as u32))
}

fn scaled(field: &str, text: &str, number: &str, scale: u128) -> Result<u128, ValidationError> {
    let invalid = || ValidationError::invalid_format(field, format!("invalid number in {:?}", text));

    let (whole, frac) = match number.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (number, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid());
    }

    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };

    let mut value = whole.checked_mul(scale).ok_or_else(invalid)?;
    let mut divisor: u128 = 1;
    for digit in frac.chars() {
        let digit = digit.to_digit(10).ok_or_else(invalid)? as u128;
        divisor *= 10;
        if divisor > scale {
            break;
        }
        value = value.checked_add(digit * scale / divisor).ok_or_else(invalid)?;
    }
    Ok(value)
}

/// Serde helpers for `Duration` fields written as duration text.
pub mod text {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_duration(*duration))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_duration("duration", &raw).map_err(serde::de::Error::custom)
    }
}

/// Serde helpers for optional `Duration` fields written as duration text.
///
/// Absent and empty strings both deserialize to `None`.
pub mod option_text {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        duration: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match duration {
            Some(d) => serializer.serialize_str(&super::format_duration(*d)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(text) => super::parse_duration("duration", text)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}
