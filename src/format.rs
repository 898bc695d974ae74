//! Display strings and user-entered time parsing.
//! Everything here is pure so both the engines and the front end can share it.

use chrono::{NaiveTime, Timelike};

use crate::{error::ValidationError, TimeOfDay};

/// Maps a 12-hour clock value onto 0-23.
/// 12 AM is midnight, 12 PM is noon.
#[must_use]
pub const fn to_24_hour(hour: u8, time_of_day: TimeOfDay) -> u8 {
    match (time_of_day, hour) {
        (TimeOfDay::AM, 12) => 0,
        (TimeOfDay::PM, 12) => 12,
        (TimeOfDay::AM, hour) => hour,
        (TimeOfDay::PM, hour) => hour + 12,
    }
}

/// Inverse of [`to_24_hour`].
#[must_use]
pub const fn from_24_hour(hour: u8) -> (u8, TimeOfDay) {
    match hour {
        0 => (12, TimeOfDay::AM),
        1..=11 => (hour, TimeOfDay::AM),
        12 => (12, TimeOfDay::PM),
        _ => (hour - 12, TimeOfDay::PM),
    }
}

/// `HH:MM:SS.cc`, used by the stopwatch and the lap list.
#[must_use]
pub fn format_stopwatch(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1000;
    let centiseconds = (ms % 1000) / 10;
    format!("{hours:02}:{minutes:02}:{seconds:02}.{centiseconds:02}")
}

/// `HH:MM:SS`, used by the countdown.
#[must_use]
pub fn format_timer(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Zero padded 12-hour clock reading (`07:05`) and its meridiem.
#[must_use]
pub fn format_12_hour(time: NaiveTime) -> (String, TimeOfDay) {
    // hour() is always below 24 so the cast can't truncate
    #[allow(clippy::cast_possible_truncation)]
    let (hour, time_of_day) = from_24_hour(time.hour() as u8);
    (format!("{hour:02}:{:02}", time.minute()), time_of_day)
}

/// `07:05 PM`
#[must_use]
pub fn format_alarm_time(time: NaiveTime) -> String {
    let (clock, time_of_day) = format_12_hour(time);
    format!("{clock} {time_of_day}")
}

/// 24-hour `HH:MM`, the persisted form of an alarm time.
#[must_use]
pub fn format_hh_mm(time: NaiveTime) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}

fn parse_number(part: &str, whole: &str) -> Result<u32, ValidationError> {
    if part.is_empty() || part.len() > 2 || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidTime(whole.to_string()));
    }
    part.parse()
        .map_err(|_| ValidationError::InvalidTime(whole.to_string()))
}

/// Strict 24-hour `HH:MM`.
pub fn parse_hh_mm(input: &str) -> Result<NaiveTime, ValidationError> {
    let (hour, minute) = input
        .trim()
        .split_once(':')
        .ok_or_else(|| ValidationError::InvalidTime(input.to_string()))?;
    let hour = parse_number(hour, input)?;
    let minute = parse_number(minute, input)?;
    NaiveTime::from_hms_opt(hour, minute, 0)
        .ok_or_else(|| ValidationError::InvalidTime(input.to_string()))
}

/// Accepts `HH:MM` (24-hour) or a 12-hour time with an `am`/`pm` suffix
/// (`7:30 pm`, `7pm`). 12-hour values are clamped into range the same way the
/// editor spinners clamp direct entry.
pub fn parse_time(input: &str) -> Result<NaiveTime, ValidationError> {
    let trimmed = input.trim().to_ascii_lowercase();
    let (clock, time_of_day) = if let Some(clock) = trimmed.strip_suffix("am") {
        (clock.trim_end(), TimeOfDay::AM)
    } else if let Some(clock) = trimmed.strip_suffix("pm") {
        (clock.trim_end(), TimeOfDay::PM)
    } else {
        return parse_hh_mm(&trimmed);
    };

    let (hour, minute) = match clock.split_once(':') {
        Some((hour, minute)) => (parse_number(hour, input)?, parse_number(minute, input)?),
        None => (parse_number(clock, input)?, 0),
    };
    #[allow(clippy::cast_possible_truncation)]
    let hour = to_24_hour(hour.clamp(1, 12) as u8, time_of_day);
    NaiveTime::from_hms_opt(u32::from(hour), minute.min(59), 0)
        .ok_or_else(|| ValidationError::InvalidTime(input.to_string()))
}

/// Duration entry for the countdown, in seconds.
///
/// Plain seconds (`90`), clock forms (`05:00`, `01:30:00`) and unit strings
/// (`1h30m`, `45s`) are accepted. Zero is returned as is, the timer decides
/// whether it is usable.
pub fn parse_duration(input: &str) -> Result<u64, ValidationError> {
    let invalid = || ValidationError::InvalidDuration(input.to_string());
    let trimmed = input.trim().to_ascii_lowercase();
    if trimmed.is_empty() {
        return Err(invalid());
    }

    if trimmed.contains(':') {
        let parts = trimmed
            .split(':')
            .map(|part| part.parse::<u64>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()?;
        return match parts.as_slice() {
            [minutes, seconds] => hms_seconds(0, *minutes, *seconds).ok_or_else(invalid),
            [hours, minutes, seconds] => {
                hms_seconds(*hours, *minutes, *seconds).ok_or_else(invalid)
            }
            _ => Err(invalid()),
        };
    }

    if let Ok(seconds) = trimmed.parse::<u64>() {
        return Ok(seconds);
    }

    let mut total: u64 = 0;
    let mut digits = String::new();
    for c in trimmed.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let unit = match c {
            'h' => 3600,
            'm' => 60,
            's' => 1,
            _ => return Err(invalid()),
        };
        let value: u64 = digits.parse().map_err(|_| invalid())?;
        total = value
            .checked_mul(unit)
            .and_then(|seconds| total.checked_add(seconds))
            .ok_or_else(invalid)?;
        digits.clear();
    }
    if digits.is_empty() {
        Ok(total)
    } else {
        Err(invalid())
    }
}

/// `hours:minutes:seconds` in seconds, `None` when it doesn't fit in a `u64`.
#[must_use]
pub fn hms_seconds(hours: u64, minutes: u64, seconds: u64) -> Option<u64> {
    hours
        .checked_mul(3600)?
        .checked_add(minutes.checked_mul(60)?)?
        .checked_add(seconds)
}

/// serde adapter storing a [`NaiveTime`] as `HH:MM`.
pub mod hh_mm {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_hh_mm(*time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_hh_mm(&raw).map_err(de::Error::custom)
    }
}
