//! Decoding of CF-style time coordinates
//!
//! Time coordinates are stored as numeric offsets together with a units string
//! of the form `"<unit> since <reference>"`, for example
//! `"seconds since 2014-03-15 00:00:00 0:00"` or `"hours since 1900-01-01 00:00:00.0"`.
//! Decoded timestamps are naive UTC datetimes.

use crate::errors::{Result, ToolboxError};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// Units string the table store writes for its index
pub const EPOCH_UNITS: &str = "seconds since 1970-01-01 00:00:00";

/// Calendars decoded on the proleptic Gregorian calendar
const GREGORIAN_CALENDARS: [&str; 3] = ["standard", "gregorian", "proleptic_gregorian"];

/// A parsed `"<unit> since <reference>"` description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeUnits {
    /// Length of one unit in microseconds
    pub unit_micros: i64,
    /// Reference instant, normalised to UTC
    pub reference: NaiveDateTime,
}

impl TimeUnits {
    /// Parses a units string.
    ///
    /// # Errors
    ///
    /// Returns [`ToolboxError::TimeDecode`] when the string is not of the form
    /// `"<unit> since <reference>"` or either part is not understood.
    pub fn parse(units: &str) -> Result<Self> {
        let lower = units.trim().to_ascii_lowercase();
        let (unit, reference) = lower.split_once(" since ").ok_or_else(|| {
            ToolboxError::time_decode(units, "expected '<unit> since <reference>'")
        })?;

        let unit = unit.trim();
        let unit_micros = unit_length_micros(unit).ok_or_else(|| {
            ToolboxError::time_decode(units, format!("unknown time unit '{unit}'"))
        })?;
        let reference_text = reference.trim();
        let reference = parse_reference(reference_text).ok_or_else(|| {
            ToolboxError::time_decode(
                units,
                format!("unreadable reference date '{reference_text}'"),
            )
        })?;

        Ok(Self {
            unit_micros,
            reference,
        })
    }

    /// Converts one numeric offset into a timestamp
    pub fn decode_value(&self, value: f64) -> Option<NaiveDateTime> {
        if !value.is_finite() {
            return None;
        }
        let micros = (value * self.unit_micros as f64).round();
        if micros.abs() >= i64::MAX as f64 {
            return None;
        }
        let offset = Duration::microseconds(micros as i64);
        self.reference.checked_add_signed(offset)
    }
}

/// Decodes numeric offsets into calendar timestamps, one per value.
///
/// `calendar` follows the CF `calendar` attribute; `None` means standard.
///
/// # Errors
///
/// Returns [`ToolboxError::TimeDecode`] for unknown units, unsupported calendars,
/// and non-finite or out-of-range offsets.
pub fn decode_times(
    values: &[f64],
    units: &str,
    calendar: Option<&str>,
) -> Result<Vec<NaiveDateTime>> {
    if let Some(calendar) = calendar {
        let calendar = calendar.trim().to_ascii_lowercase();
        if !GREGORIAN_CALENDARS.contains(&calendar.as_str()) {
            return Err(ToolboxError::time_decode(
                units,
                format!("unsupported calendar '{calendar}'"),
            ));
        }
    }

    let parsed = TimeUnits::parse(units)?;
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            parsed.decode_value(v).ok_or_else(|| {
                ToolboxError::time_decode(
                    units,
                    format!("offset {v} at position {i} is not a valid time"),
                )
            })
        })
        .collect()
}

/// Encodes timestamps as seconds since 1970-01-01 (see [`EPOCH_UNITS`])
pub fn encode_seconds_since_epoch(times: &[NaiveDateTime]) -> Vec<f64> {
    let epoch = unix_epoch();
    times
        .iter()
        .map(|t| {
            let delta = *t - epoch;
            match delta.num_microseconds() {
                Some(us) => us as f64 / 1e6,
                None => delta.num_milliseconds() as f64 / 1e3,
            }
        })
        .collect()
}

/// Midnight at the start of the day containing `t`
pub fn start_of_day(t: NaiveDateTime) -> NaiveDateTime {
    t.date().and_time(NaiveTime::MIN)
}

fn unix_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1970, 1, 1)
        .map(|d| d.and_time(NaiveTime::MIN))
        .unwrap_or_default()
}

fn unit_length_micros(unit: &str) -> Option<i64> {
    let micros = match unit {
        "microseconds" | "microsecond" | "us" => 1,
        "milliseconds" | "millisecond" | "msec" | "msecs" | "ms" => 1_000,
        "seconds" | "second" | "secs" | "sec" | "s" => 1_000_000,
        "minutes" | "minute" | "mins" | "min" => 60_000_000,
        "hours" | "hour" | "hrs" | "hr" | "h" => 3_600_000_000,
        "days" | "day" | "d" => 86_400_000_000,
        "weeks" | "week" => 604_800_000_000,
        _ => return None,
    };
    Some(micros)
}

/// Parses `YYYY-MM-DD[( |T)HH[:MM[:SS[.f]]]][ tz]` into a UTC datetime
fn parse_reference(reference: &str) -> Option<NaiveDateTime> {
    let mut reference = reference.to_string();
    if reference.as_bytes().get(10) == Some(&b't') {
        reference.replace_range(10..11, " ");
    }
    let mut parts = reference.split_whitespace();

    let date = NaiveDate::parse_from_str(parts.next()?, "%Y-%m-%d").ok()?;
    let mut datetime = date.and_time(NaiveTime::MIN);

    let mut seen_clock = false;
    let mut offset_minutes = 0_i64;
    for part in parts {
        let clock = if seen_clock { None } else { parse_clock(part) };
        if let Some(time) = clock {
            datetime = date.and_time(time);
            seen_clock = true;
        } else if let Some(minutes) = parse_offset(part) {
            offset_minutes = minutes;
        } else {
            return None;
        }
    }

    datetime.checked_sub_signed(Duration::minutes(offset_minutes))
}

fn parse_clock(part: &str) -> Option<NaiveTime> {
    // "12:00:00z" is a clock time with a UTC designator attached
    let part = part.strip_suffix('z').unwrap_or(part);
    if part.starts_with('+') || part.starts_with('-') {
        return None;
    }
    match part.matches(':').count() {
        2 => NaiveTime::parse_from_str(part, "%H:%M:%S%.f").ok(),
        1 => NaiveTime::parse_from_str(part, "%H:%M").ok(),
        _ => None,
    }
}

/// Offset in minutes east of UTC
fn parse_offset(part: &str) -> Option<i64> {
    if part == "z" || part == "utc" || part == "gmt" {
        return Some(0);
    }
    let (sign, body) = match part.as_bytes().first()? {
        b'+' => (1, &part[1..]),
        b'-' => (-1, &part[1..]),
        _ => (1, part),
    };
    let (hours, minutes) = match body.split_once(':') {
        Some((h, m)) => (h.parse::<i64>().ok()?, m.parse::<i64>().ok()?),
        None if body.len() == 4 => (
            body.get(..2)?.parse::<i64>().ok()?,
            body.get(2..)?.parse::<i64>().ok()?,
        ),
        None => (body.parse::<i64>().ok()?, 0),
    };
    if !(0..=14).contains(&hours) || !(0..=59).contains(&minutes) {
        return None;
    }
    Some(sign * (hours * 60 + minutes))
}
