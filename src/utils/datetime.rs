use anyhow::{anyhow, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

/// Time used when an admin enters a date without a time.
pub const DEFAULT_EVENT_TIME: (u32, u32) = (18, 0);

const DATETIME_FORMATS: &[&str] = &["%d.%m.%Y %H:%M", "%Y-%m-%d %H:%M"];
const DATE_FORMATS: &[&str] = &["%d.%m.%Y", "%Y-%m-%d"];

/// Club-local offset from whole hours east of UTC.
pub fn club_offset(hours: i32) -> Option<FixedOffset> {
    if !(-12..=14).contains(&hours) {
        return None;
    }
    FixedOffset::east_opt(hours * 3600)
}

/// Parses an admin-entered date in club-local time.
///
/// Accepts `DD.MM.YYYY HH:MM`, `YYYY-MM-DD HH:MM`, or a bare date which
/// defaults to 18:00. Dates before `now` are refused.
pub fn parse_event_datetime(
    input: &str,
    offset: FixedOffset,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return Err(anyhow!("Date cannot be empty"));
    }

    let naive = parse_naive(input).ok_or_else(|| {
        anyhow!("Unrecognized date '{}'. Use DD.MM.YYYY HH:MM", input)
    })?;

    let local = offset
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| anyhow!("Ambiguous local time '{}'", input))?;
    let utc = local.with_timezone(&Utc);

    if utc < now {
        return Err(anyhow!("Date cannot be in the past"));
    }
    Ok(utc)
}

fn parse_naive(input: &str) -> Option<NaiveDateTime> {
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, format) {
            return Some(dt);
        }
    }
    let (hour, minute) = DEFAULT_EVENT_TIME;
    let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(input, format).ok())
        .map(|date| date.and_time(time))
}

pub fn format_event_datetime(dt: &DateTime<Utc>, offset: FixedOffset) -> String {
    dt.with_timezone(&offset).format("%d.%m.%Y %H:%M").to_string()
}
