use board_core::{DayLabel, DayWindow};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;

/// Window length from local midnight: the window closes at 23:59, not at the
/// end of the day.
pub const WINDOW_MINUTES: i64 = 23 * 60 + 59;

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Walks forward one calendar day at a time, counting only weekdays.
/// Holidays are not skipped.
pub fn add_business_days(date: NaiveDate, days: u32) -> NaiveDate {
    let mut current = date;
    let mut remaining = days;
    while remaining > 0 {
        let Some(next) = current.succ_opt() else {
            break;
        };
        current = next;
        if !is_weekend(current) {
            remaining -= 1;
        }
    }
    current
}

/// Today plus the next two business days, each with its local-day window in UTC.
pub fn compute_buckets(reference_date: NaiveDate, tz: &Tz) -> [DayWindow; 3] {
    DayLabel::ALL.map(|label| {
        let date = add_business_days(reference_date, label.index() as u32);
        day_window(label, date, tz)
    })
}

pub fn day_window(label: DayLabel, date: NaiveDate, tz: &Tz) -> DayWindow {
    let midnight = date.and_time(NaiveTime::MIN);
    let close = midnight + Duration::minutes(WINDOW_MINUTES);
    DayWindow {
        label,
        date,
        start: local_to_utc(tz, midnight),
        end: local_to_utc(tz, close),
    }
}

/// Resolves a wall-clock time with the offset in force at that instant.
///
/// Ambiguous times take the earlier instant; times inside a DST gap move to
/// the first valid instant after it.
pub fn local_to_utc(tz: &Tz, local: NaiveDateTime) -> DateTime<Utc> {
    if let Some(resolved) = tz.from_local_datetime(&local).earliest() {
        return resolved.with_timezone(&Utc);
    }
    let shifted = local + Duration::hours(1);
    match tz.from_local_datetime(&shifted).earliest() {
        Some(resolved) => resolved.with_timezone(&Utc),
        None => local.and_utc(),
    }
}

pub fn weekday_name(date: NaiveDate) -> String {
    date.format("%A").to_string()
}
