//! Parsing of dates and clock times typed on the command line.
//!
//! Operators type local wall-clock values; the store keeps UTC instants.

use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// `YYYY-MM-DD`, or today when absent.
pub fn parse_date(value: Option<&str>) -> Result<NaiveDate, String> {
    match value {
        Some(d) => NaiveDate::parse_from_str(d, "%Y-%m-%d")
            .map_err(|_| format!("Invalid date format '{}'. Use YYYY-MM-DD.", d)),
        None => Ok(today()),
    }
}

/// `HH:MM`, or the current time when absent.
pub fn parse_time(value: Option<&str>) -> Result<NaiveTime, String> {
    match value {
        Some(t) => NaiveTime::parse_from_str(t, "%H:%M")
            .map_err(|_| format!("Invalid time format '{}'. Use HH:MM.", t)),
        None => Ok(Local::now().time()),
    }
}

/// The instant at which `time` occurs on `date` in local time.
pub fn local_instant(date: NaiveDate, time: NaiveTime) -> Result<DateTime<Utc>, String> {
    Local
        .from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| format!("{} {} does not exist in the local time zone", date, time))
}

/// End of a run started at `start`, typed as a clock time. A time earlier
/// than the start means the run went past midnight.
pub fn end_instant(start: &DateTime<Utc>, time: NaiveTime) -> Result<DateTime<Utc>, String> {
    let start_day = start.with_timezone(&Local).date_naive();
    let same_day = local_instant(start_day, time)?;
    if same_day >= *start {
        return Ok(same_day);
    }
    let next_day = start_day
        .succ_opt()
        .ok_or_else(|| format!("No day after {}", start_day))?;
    local_instant(next_day, time)
}

/// Calendar dates are stored as UTC midnight so that month grouping
/// matches the date the operator typed.
pub fn calendar_date(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Formats an instant as local `HH:MM`.
pub fn clock(instant: &DateTime<Utc>) -> String {
    instant.with_timezone(&Local).format("%H:%M").to_string()
}

/// Formats a stored calendar date as `DD/MM/YYYY`.
pub fn day(date: &DateTime<Utc>) -> String {
    date.format("%d/%m/%Y").to_string()
}
