use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use crate::error::ValidationError;

/// Parse a `YYYY-MM-DD` date input.
pub fn parse_date_input(s: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(s.to_string()))
}

/// Parse an `HH:MM` time input. Blank means midnight.
pub fn parse_time_input(s: &str) -> Result<NaiveTime, ValidationError> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(NaiveTime::MIN);
    }
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| ValidationError::InvalidTime(s.to_string()))
}

/// Rejects a due date strictly before `today`. Only the calendar date counts.
pub fn ensure_not_before(due: NaiveDate, today: NaiveDate) -> Result<(), ValidationError> {
    if due < today {
        Err(ValidationError::DueDateInPast)
    } else {
        Ok(())
    }
}

/// Interpret a wall-clock date and time in the local zone.
///
/// An ambiguous time (clocks going back) takes the earlier instant. A time
/// inside a DST gap moves forward by an hour, so 02:30 on a spring-forward
/// night becomes 03:30.
pub fn local_to_utc(naive: NaiveDateTime) -> Result<DateTime<Utc>, ValidationError> {
    resolve_local(naive, |wall| {
        Local
            .from_local_datetime(wall)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    })
    .ok_or_else(|| ValidationError::InvalidTime(naive.time().format("%H:%M").to_string()))
}

fn resolve_local(
    naive: NaiveDateTime,
    lookup: impl Fn(&NaiveDateTime) -> Option<DateTime<Utc>>,
) -> Option<DateTime<Utc>> {
    lookup(&naive).or_else(|| lookup(&(naive + Duration::hours(1))))
}

/// Combine separate date and time inputs into the timestamp sent to the API.
///
/// A blank date means "no due date" and yields `None`, whatever the time
/// field holds.
pub fn due_timestamp(
    date: &str,
    time: &str,
    today: NaiveDate,
) -> Result<Option<DateTime<Utc>>, ValidationError> {
    if date.trim().is_empty() {
        return Ok(None);
    }
    let day = parse_date_input(date)?;
    ensure_not_before(day, today)?;
    let at = parse_time_input(time)?;
    local_to_utc(day.and_time(at)).map(Some)
}

/// Inverse of [`due_timestamp`]: local `YYYY-MM-DD` and `HH:MM` strings.
pub fn split_due_date(due: DateTime<Utc>) -> (String, String) {
    let local = due.with_timezone(&Local);
    (
        local.format("%Y-%m-%d").to_string(),
        local.format("%H:%M").to_string(),
    )
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn blank_date_is_no_due_date() {
        assert_eq!(due_timestamp("", "10:00", day(2026, 10, 18)), Ok(None));
        assert_eq!(due_timestamp("  ", "", day(2026, 10, 18)), Ok(None));
    }

    #[test]
    fn gap_time_moves_forward_an_hour() {
        // A UTC-5 zone that skips 02:00-02:59 on 2027-03-14.
        let lookup = |wall: &NaiveDateTime| {
            let skipped = wall.date() == day(2027, 3, 14) && wall.hour() == 2;
            (!skipped).then(|| (*wall + Duration::hours(5)).and_utc())
        };
        let gap = day(2027, 3, 14).and_hms_opt(2, 30, 0).unwrap();
        let after = day(2027, 3, 14).and_hms_opt(3, 30, 0).unwrap();
        assert_eq!(resolve_local(gap, lookup), lookup(&after));
        assert_eq!(resolve_local(after, lookup), lookup(&after));
    }

    #[test]
    fn yesterday_rejected_at_any_time() {
        let today = day(2026, 10, 18);
        for time in ["00:00", "12:00", "23:59"] {
            assert_eq!(
                due_timestamp("2026-10-17", time, today),
                Err(ValidationError::DueDateInPast)
            );
        }
    }

    #[test]
    fn today_accepted_even_at_midnight() {
        let today = day(2026, 10, 18);
        let due = due_timestamp("2026-10-18", "00:00", today).unwrap().unwrap();
        let (date, time) = split_due_date(due);
        assert_eq!(date, "2026-10-18");
        assert_eq!(time, "00:00");
    }

    #[test]
    fn combines_date_and_time_in_local_zone() {
        let due = due_timestamp("2026-12-24", "18:45", day(2026, 10, 18))
            .unwrap()
            .unwrap();
        assert_eq!(
            split_due_date(due),
            ("2026-12-24".to_string(), "18:45".to_string())
        );
    }

    #[test]
    fn malformed_inputs() {
        let today = day(2026, 10, 18);
        assert!(matches!(
            due_timestamp("24/12/2026", "", today),
            Err(ValidationError::InvalidDate(_))
        ));
        assert!(matches!(
            due_timestamp("2026-12-24", "6pm", today),
            Err(ValidationError::InvalidTime(_))
        ));
    }

    #[test]
    fn blank_time_is_midnight() {
        assert_eq!(parse_time_input(""), Ok(NaiveTime::MIN));
        assert_eq!(
            parse_time_input("07:30"),
            Ok(NaiveTime::from_hms_opt(7, 30, 0).unwrap())
        );
    }
}
