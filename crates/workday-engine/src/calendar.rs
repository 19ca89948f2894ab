//! The fixed regional work calendar.
//!
//! Monday to Friday, 08:00 to 17:00 local time with an unpaid 12:00 to 13:00
//! break, minus the supplied holidays. All wall-clock decisions are taken in
//! the timezone carried by the `DateTime<Tz>` being inspected; the service
//! itself always works in [`BUSINESS_TZ`].

use chrono::{
    DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset,
    TimeZone, Timelike, Weekday,
};
use chrono_tz::Tz;

use crate::holidays::HolidaySet;

/// The civil timezone every calendar boundary is evaluated in.
pub const BUSINESS_TZ: Tz = chrono_tz::America::Bogota;

// ── Work window ─────────────────────────────────────────────────────────────

pub const WORK_START_HOUR: u32 = 8;
pub const LUNCH_START_HOUR: u32 = 12;
pub const LUNCH_END_HOUR: u32 = 13;
pub const WORK_END_HOUR: u32 = 17;

const MORNING_START: u32 = WORK_START_HOUR * 60;
const MORNING_END: u32 = LUNCH_START_HOUR * 60;
const AFTERNOON_START: u32 = LUNCH_END_HOUR * 60;
const AFTERNOON_END: u32 = WORK_END_HOUR * 60;

// ── Predicates ──────────────────────────────────────────────────────────────

/// Monday to Friday and not a holiday.
pub fn is_working_day(date: NaiveDate, holidays: &HolidaySet) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !holidays.contains(date)
}

/// Whether the local time of day lies in `[08:00,12:00)` or `[13:00,17:00)`.
///
/// Only the clock is inspected. Combine with [`is_working_day`] when the date
/// matters too.
pub fn is_working_minute(instant: &DateTime<Tz>) -> bool {
    let minute = minute_of_day(instant);
    (MORNING_START..MORNING_END).contains(&minute)
        || (AFTERNOON_START..AFTERNOON_END).contains(&minute)
}

/// Minute of the local day for the segment boundary math.
pub(crate) fn minute_of_day(instant: &DateTime<Tz>) -> u32 {
    instant.hour() * 60 + instant.minute()
}

/// End of the morning segment if `instant` is before lunch, otherwise end of day.
pub(crate) fn segment_end_minute(instant: &DateTime<Tz>) -> u32 {
    if minute_of_day(instant) < MORNING_END {
        MORNING_END
    } else {
        AFTERNOON_END
    }
}

// ── Boundary walkers ────────────────────────────────────────────────────────

/// The closest working day strictly before `from`'s local date, at 17:00.
pub fn previous_working_day_end(from: &DateTime<Tz>, holidays: &HolidaySet) -> DateTime<Tz> {
    let mut date = from.date_naive();
    loop {
        date = date - Duration::days(1);
        if is_working_day(date, holidays) {
            return at_hour_on(from.timezone(), date, WORK_END_HOUR);
        }
    }
}

/// The closest working day strictly after `from`'s local date, at 08:00.
pub fn next_working_day_start(from: &DateTime<Tz>, holidays: &HolidaySet) -> DateTime<Tz> {
    let mut date = from.date_naive();
    loop {
        date = date + Duration::days(1);
        if is_working_day(date, holidays) {
            return at_hour_on(from.timezone(), date, WORK_START_HOUR);
        }
    }
}

// ── Wall-clock helpers ──────────────────────────────────────────────────────

/// Same local date as `instant`, at `hour:00:00.000`.
pub(crate) fn at_hour(instant: &DateTime<Tz>, hour: u32) -> DateTime<Tz> {
    at_hour_on(instant.timezone(), instant.date_naive(), hour)
}

fn at_hour_on(tz: Tz, date: NaiveDate, hour: u32) -> DateTime<Tz> {
    let naive = date.and_time(NaiveTime::MIN) + Duration::hours(i64::from(hour));
    localize(tz, naive)
}

/// Move the local date by `days`, keeping the local time of day.
pub(crate) fn shift_days(instant: &DateTime<Tz>, days: i64) -> DateTime<Tz> {
    localize(
        instant.timezone(),
        instant.naive_local() + Duration::days(days),
    )
}

/// Drop seconds and sub-second precision.
pub(crate) fn truncate_to_minute(instant: &DateTime<Tz>) -> DateTime<Tz> {
    let naive = instant.naive_local();
    let truncated = naive
        .with_second(0)
        .and_then(|n| n.with_nanosecond(0))
        .unwrap_or(naive);
    instant.timezone().from_local_datetime(&truncated).earliest().unwrap_or(*instant)
}

/// Resolve a local wall-clock time to an instant.
///
/// Repeated wall times take the earlier instant. Wall times skipped by a
/// forward transition are read with the offset in force before it, which
/// lands just after the gap.
fn localize(tz: Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            let before = tz
                .offset_from_utc_datetime(&(naive - Duration::days(1)))
                .fix()
                .local_minus_utc();
            tz.from_utc_datetime(&(naive - Duration::seconds(i64::from(before))))
        }
    }
}
