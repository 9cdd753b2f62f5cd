use chrono::{DateTime, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;

use crate::error::{AppError, Result};

/// Parses a local wall-clock time written as `HH:MM`.
pub fn parse_clock(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|err| AppError::InvalidInput(format!("invalid time {:?}: {}", value, err)))
}

pub fn local_datetime(now: DateTime<Utc>, tz: &Tz) -> NaiveDateTime {
    now.with_timezone(tz).naive_local()
}
