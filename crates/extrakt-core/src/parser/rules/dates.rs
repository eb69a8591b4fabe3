//! Date and time parsing for `DD.MM.YYYY` / `HH:MM:SS` fragments.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use super::patterns::{DATE_DMY, TIME_HMS};
use crate::error::ExtractionError;

/// Parse `DD.MM.YYYY` (two-digit years are accepted too).
pub fn parse_date(text: &str) -> Result<NaiveDate, ExtractionError> {
    let trimmed = text.trim();
    let caps = DATE_DMY
        .captures(trimmed)
        .ok_or_else(|| ExtractionError::malformed("date", text, "expected DD.MM.YYYY"))?;

    let day: u32 = caps[1].parse().unwrap_or(0);
    let month: u32 = caps[2].parse().unwrap_or(0);
    let year = parse_year(&caps[3]);

    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| ExtractionError::malformed("date", text, "no such calendar date"))
}

/// Parse `HH:MM:SS` or `HH:MM`.
pub fn parse_time(text: &str) -> Result<NaiveTime, ExtractionError> {
    let trimmed = text.trim();
    let caps = TIME_HMS
        .captures(trimmed)
        .ok_or_else(|| ExtractionError::malformed("time", text, "expected HH:MM:SS"))?;

    let hour: u32 = caps[1].parse().unwrap_or(99);
    let minute: u32 = caps[2].parse().unwrap_or(99);
    let second: u32 = caps
        .get(3)
        .map(|m| m.as_str().parse().unwrap_or(99))
        .unwrap_or(0);

    NaiveTime::from_hms_opt(hour, minute, second)
        .ok_or_else(|| ExtractionError::malformed("time", text, "no such time of day"))
}

/// Combine a date with an optional time; midnight when absent.
pub fn combine_date_time(
    date: NaiveDate,
    time: Option<NaiveTime>,
) -> Result<NaiveDateTime, ExtractionError> {
    match time {
        Some(time) => Ok(date.and_time(time)),
        None => date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| ExtractionError::malformed("date", &date.to_string(), "no midnight")),
    }
}

fn parse_year(s: &str) -> i32 {
    let year: i32 = s.parse().unwrap_or(0);
    if year < 100 {
        // Two-digit year: assume 2000s for 00-50, 1900s for 51-99
        if year <= 50 {
            2000 + year
        } else {
            1900 + year
        }
    } else {
        year
    }
}
