//! Working-time arithmetic.
//!
//! A calculation first normalizes the reference instant onto the work
//! calendar ([`adjust_to_working_time`]), then advances by whole working days
//! ([`add_working_days`]) and finally by working hours
//! ([`add_working_hours`]). All functions are pure: they take the holiday set
//! as a value and never touch the network.
//!
//! # Normalization is backward, advancement is forward
//!
//! An instant outside the work window snaps *back* to the last working
//! boundary: weekends, holidays and early mornings go to the previous working
//! day's 17:00, evenings to the same day's 17:00 and the lunch hour to 12:00.
//! Hour addition instead skips *forward* over the same gaps (lunch resumes at
//! 13:00, evenings continue at the next working day's 08:00).

use chrono::{DateTime, Duration, Timelike, Utc};
use chrono_tz::Tz;

use crate::calendar::{
    at_hour, is_working_day, is_working_minute, minute_of_day, next_working_day_start,
    previous_working_day_end, segment_end_minute, shift_days, truncate_to_minute, BUSINESS_TZ,
    LUNCH_END_HOUR, LUNCH_START_HOUR, WORK_END_HOUR, WORK_START_HOUR,
};
use crate::error::{Result, WorkdayError};
use crate::holidays::HolidaySet;

// ── calculate_working_date ──────────────────────────────────────────────────

/// Inputs of a single calculation, already validated by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CalculationRequest {
    /// Reference instant; `None` means "now".
    pub start: Option<DateTime<Utc>>,
    pub days: u32,
    pub hours: u32,
}

impl CalculationRequest {
    pub fn evaluate(&self, holidays: &HolidaySet) -> DateTime<Utc> {
        calculate_working_date(self.start, self.days, self.hours, holidays)
    }
}

/// Resolve `start + days working days + hours working hours`.
///
/// `start` defaults to the current instant. The result is always a UTC
/// instant with whole-minute precision. With `days == 0` and `hours == 0`
/// the normalized start is returned.
///
/// # Examples
///
/// ```
/// use chrono::{NaiveDate, TimeZone, Utc};
/// use workday_engine::{calculate_working_date, HolidaySet};
///
/// let holidays = HolidaySet::new([
///     NaiveDate::from_ymd_opt(2025, 4, 17).unwrap(),
///     NaiveDate::from_ymd_opt(2025, 4, 18).unwrap(),
/// ])
/// .unwrap();
///
/// // Thursday 10:00 in Bogotá, +5 working days, +4 working hours
/// let start = Utc.with_ymd_and_hms(2025, 4, 10, 15, 0, 0).unwrap();
/// let result = calculate_working_date(Some(start), 5, 4, &holidays);
/// assert_eq!(result, Utc.with_ymd_and_hms(2025, 4, 21, 20, 0, 0).unwrap());
/// ```
pub fn calculate_working_date(
    start: Option<DateTime<Utc>>,
    days: u32,
    hours: u32,
    holidays: &HolidaySet,
) -> DateTime<Utc> {
    let start = start.unwrap_or_else(Utc::now).with_timezone(&BUSINESS_TZ);

    let mut current = adjust_to_working_time(&start, holidays);
    if days > 0 {
        current = add_working_days(&current, days, holidays);
    }
    if hours > 0 {
        current = add_working_hours(&current, f64::from(hours), holidays);
    }

    current.with_timezone(&Utc)
}

/// Parse an RFC 3339 instant for use as a calculation start.
///
/// # Errors
///
/// Returns [`WorkdayError::InvalidDatetime`] if the string cannot be parsed.
pub fn parse_start(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| WorkdayError::InvalidDatetime(format!("'{}': {}", s, e)))
}

// ── adjust_to_working_time ──────────────────────────────────────────────────

/// Snap an arbitrary instant onto the work calendar.
///
/// Seconds are dropped first. Then:
/// - non-working date → previous working day at 17:00
/// - before 08:00 → previous working day at 17:00
/// - at or after 17:00 → same day at 17:00
/// - during lunch → same day at 12:00
/// - otherwise unchanged
pub fn adjust_to_working_time(instant: &DateTime<Tz>, holidays: &HolidaySet) -> DateTime<Tz> {
    let instant = truncate_to_minute(instant);

    if !is_working_day(instant.date_naive(), holidays) {
        return previous_working_day_end(&instant, holidays);
    }

    let hour = instant.hour();
    if hour < WORK_START_HOUR {
        previous_working_day_end(&instant, holidays)
    } else if hour >= WORK_END_HOUR {
        at_hour(&instant, WORK_END_HOUR)
    } else if (LUNCH_START_HOUR..LUNCH_END_HOUR).contains(&hour) {
        at_hour(&instant, LUNCH_START_HOUR)
    } else {
        instant
    }
}

// ── add_working_days ────────────────────────────────────────────────────────

/// Step forward one calendar day at a time until `days` working days passed.
///
/// The local time of day is kept as is, so `start` should already be a
/// normalized working instant.
pub fn add_working_days(start: &DateTime<Tz>, days: u32, holidays: &HolidaySet) -> DateTime<Tz> {
    let mut current = truncate_to_minute(start);
    let mut remaining = days;

    while remaining > 0 {
        current = shift_days(&current, 1);
        if is_working_day(current.date_naive(), holidays) {
            remaining -= 1;
        }
    }

    current
}

// ── add_working_hours ───────────────────────────────────────────────────────

/// Consume `hours` (rounded to whole minutes) of working time from `start`.
///
/// Time outside `[08:00,12:00)` and `[13:00,17:00)` is skipped: before
/// opening jumps to 08:00, lunch jumps to 13:00, and closing time jumps to
/// the next working day's 08:00.
pub fn add_working_hours(start: &DateTime<Tz>, hours: f64, holidays: &HolidaySet) -> DateTime<Tz> {
    let mut current = truncate_to_minute(start);
    let mut remaining = (hours * 60.0).round() as i64;

    while remaining > 0 {
        if !is_working_minute(&current) {
            current = skip_to_working_minute(&current, holidays);
            continue;
        }

        let available = i64::from(segment_end_minute(&current) - minute_of_day(&current));
        let used = remaining.min(available);
        current = current + Duration::minutes(used);
        remaining -= used;

        if remaining > 0 {
            let hour = current.hour();
            if hour == LUNCH_START_HOUR {
                current = at_hour(&current, LUNCH_END_HOUR);
            } else if hour >= WORK_END_HOUR {
                current = next_working_day_start(&current, holidays);
            }
        }
    }

    truncate_to_minute(&current)
}

fn skip_to_working_minute(instant: &DateTime<Tz>, holidays: &HolidaySet) -> DateTime<Tz> {
    let hour = instant.hour();
    if hour < WORK_START_HOUR {
        at_hour(instant, WORK_START_HOUR)
    } else if hour >= WORK_END_HOUR {
        next_working_day_start(instant, holidays)
    } else {
        at_hour(instant, LUNCH_END_HOUR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate, TimeZone, Weekday};
    use proptest::prelude::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// A set whose only member is far from every date used below.
    fn unrelated_holidays() -> HolidaySet {
        HolidaySet::new([ymd(2025, 1, 1)]).unwrap()
    }

    fn easter_holidays() -> HolidaySet {
        HolidaySet::new([ymd(2025, 4, 17), ymd(2025, 4, 18)]).unwrap()
    }

    fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Tz> {
        BUSINESS_TZ.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn utc(s: &str) -> DateTime<Utc> {
        parse_start(s).unwrap()
    }

    fn iso(dt: DateTime<Utc>) -> String {
        dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
    }

    // ── calculate_working_date scenarios ────────────────────────────────

    #[test]
    fn test_friday_close_plus_one_hour() {
        // Friday 17:00 local → Monday 09:00 local
        let result = calculate_working_date(
            Some(utc("2025-05-23T22:00:00Z")),
            0,
            1,
            &unrelated_holidays(),
        );
        assert_eq!(iso(result), "2025-05-26T14:00:00.000Z");
    }

    #[test]
    fn test_tuesday_afternoon_plus_day_and_hours() {
        // Tuesday 15:00 local, +1 day, +4 hours → Thursday 10:00 local
        let result = calculate_working_date(
            Some(utc("2025-05-13T20:00:00Z")),
            1,
            4,
            &unrelated_holidays(),
        );
        assert_eq!(iso(result), "2025-05-15T15:00:00.000Z");
    }

    #[test]
    fn test_skips_holy_week_holidays() {
        // Thursday 10 Apr 10:00 local, +5 days, +4 hours → Monday 21 Apr 15:00 local
        let result = calculate_working_date(
            Some(utc("2025-04-10T15:00:00.000Z")),
            5,
            4,
            &easter_holidays(),
        );
        assert_eq!(iso(result), "2025-04-21T20:00:00.000Z");
    }

    #[test]
    fn test_no_advancement_returns_normalized_start() {
        // Saturday noon → Friday 17:00
        let result = calculate_working_date(
            Some(utc("2025-05-24T17:00:00Z")),
            0,
            0,
            &unrelated_holidays(),
        );
        assert_eq!(iso(result), "2025-05-23T22:00:00.000Z");
    }

    #[test]
    fn test_days_apply_before_hours() {
        // Friday 16:00 local, +1 day → Monday 16:00, +2 hours → Tuesday 09:00
        let result = calculate_working_date(
            Some(utc("2025-05-23T21:00:00Z")),
            1,
            2,
            &unrelated_holidays(),
        );
        assert_eq!(iso(result), "2025-05-27T14:00:00.000Z");
    }

    #[test]
    fn test_seconds_are_cleared() {
        let result = calculate_working_date(
            Some(utc("2025-05-13T15:30:45.678Z")),
            0,
            1,
            &unrelated_holidays(),
        );
        // 10:30 local + 1h = 11:30 local
        assert_eq!(iso(result), "2025-05-13T16:30:00.000Z");
    }

    #[test]
    fn test_request_evaluate_matches_function() {
        let request = CalculationRequest {
            start: Some(utc("2025-04-10T15:00:00Z")),
            days: 5,
            hours: 4,
        };
        assert_eq!(
            request.evaluate(&easter_holidays()),
            utc("2025-04-21T20:00:00Z")
        );
    }

    #[test]
    fn test_default_start_yields_working_boundary() {
        let result = calculate_working_date(None, 0, 1, &unrelated_holidays())
            .with_timezone(&BUSINESS_TZ);
        assert_eq!(result.second(), 0);
        assert!(is_working_day(result.date_naive(), &unrelated_holidays()));
        let minute = minute_of_day(&result);
        assert!((8 * 60 + 1..=12 * 60).contains(&minute) || (13 * 60 + 1..=17 * 60).contains(&minute));
    }

    #[test]
    fn test_parse_start_rejects_garbage() {
        let err = parse_start("yesterday").unwrap_err();
        assert!(err.to_string().contains("Invalid datetime"), "got: {err}");
    }

    // ── adjust_to_working_time ──────────────────────────────────────────

    #[test]
    fn test_adjust_within_window_unchanged() {
        let dt = local(2025, 5, 13, 9, 45);
        assert_eq!(adjust_to_working_time(&dt, &unrelated_holidays()), dt);
    }

    #[test]
    fn test_adjust_early_morning_goes_to_previous_day_end() {
        let result = adjust_to_working_time(&local(2025, 5, 13, 7, 59), &unrelated_holidays());
        assert_eq!(result, local(2025, 5, 12, 17, 0));
    }

    #[test]
    fn test_adjust_monday_early_goes_to_friday() {
        let result = adjust_to_working_time(&local(2025, 5, 26, 6, 0), &unrelated_holidays());
        assert_eq!(result, local(2025, 5, 23, 17, 0));
    }

    #[test]
    fn test_adjust_evening_clamps_to_close() {
        let result = adjust_to_working_time(&local(2025, 5, 13, 21, 30), &unrelated_holidays());
        assert_eq!(result, local(2025, 5, 13, 17, 0));
    }

    #[test]
    fn test_adjust_lunch_snaps_back_to_noon() {
        let result = adjust_to_working_time(&local(2025, 5, 13, 12, 40), &unrelated_holidays());
        assert_eq!(result, local(2025, 5, 13, 12, 0));
    }

    #[test]
    fn test_adjust_holiday_goes_to_previous_working_day() {
        let result = adjust_to_working_time(&local(2025, 4, 18, 10, 0), &easter_holidays());
        assert_eq!(result, local(2025, 4, 16, 17, 0));
    }

    // ── add_working_days ────────────────────────────────────────────────

    #[test]
    fn test_add_days_across_weekend() {
        let result = add_working_days(&local(2025, 5, 23, 10, 0), 1, &unrelated_holidays());
        assert_eq!(result, local(2025, 5, 26, 10, 0));
    }

    #[test]
    fn test_add_days_zero_is_identity() {
        let dt = local(2025, 5, 23, 10, 0);
        assert_eq!(add_working_days(&dt, 0, &unrelated_holidays()), dt);
    }

    #[test]
    fn test_add_days_across_holidays() {
        let result = add_working_days(&local(2025, 4, 16, 11, 0), 1, &easter_holidays());
        assert_eq!(result, local(2025, 4, 21, 11, 0));
    }

    // ── add_working_hours ───────────────────────────────────────────────

    #[test]
    fn test_add_hours_skips_lunch() {
        let result = add_working_hours(&local(2025, 5, 13, 11, 0), 2.0, &unrelated_holidays());
        assert_eq!(result, local(2025, 5, 13, 14, 0));
    }

    #[test]
    fn test_add_hours_from_noon_resumes_after_lunch() {
        let result = add_working_hours(&local(2025, 5, 13, 12, 0), 1.0, &unrelated_holidays());
        assert_eq!(result, local(2025, 5, 13, 14, 0));
    }

    #[test]
    fn test_add_hours_exactly_to_close() {
        let result = add_working_hours(&local(2025, 5, 13, 16, 0), 1.0, &unrelated_holidays());
        assert_eq!(result, local(2025, 5, 13, 17, 0));
    }

    #[test]
    fn test_add_hours_before_opening() {
        let result = add_working_hours(&local(2025, 5, 13, 6, 0), 1.0, &unrelated_holidays());
        assert_eq!(result, local(2025, 5, 13, 9, 0));
    }

    #[test]
    fn test_add_hours_fraction_rounds_to_minutes() {
        let result = add_working_hours(&local(2025, 5, 13, 9, 0), 0.5, &unrelated_holidays());
        assert_eq!(result, local(2025, 5, 13, 9, 30));
    }

    #[test]
    fn test_add_full_week_of_hours() {
        // 40 working hours from Monday 08:00 end on Friday 17:00
        let result = add_working_hours(&local(2025, 5, 12, 8, 0), 40.0, &unrelated_holidays());
        assert_eq!(result, local(2025, 5, 16, 17, 0));
    }

    // ── properties ──────────────────────────────────────────────────────

    fn sample_holidays() -> HolidaySet {
        HolidaySet::new([ymd(2025, 5, 1), ymd(2025, 6, 2), ymd(2025, 6, 23)]).unwrap()
    }

    /// Dates in May–June 2025 matching `pred`.
    fn dates_where(pred: fn(NaiveDate, &HolidaySet) -> bool) -> Vec<NaiveDate> {
        let holidays = sample_holidays();
        (0..61)
            .map(|d| ymd(2025, 5, 1) + Duration::days(d))
            .filter(|d| pred(*d, &holidays))
            .collect()
    }

    fn working_dates() -> Vec<NaiveDate> {
        dates_where(|d, h| is_working_day(d, h))
    }

    fn non_working_dates() -> Vec<NaiveDate> {
        dates_where(|d, h| !is_working_day(d, h))
    }

    /// Local instants on one of `dates`, at a minute of day drawn from `minutes`.
    fn instant_on(
        dates: Vec<NaiveDate>,
        minutes: impl Strategy<Value = u32>,
    ) -> impl Strategy<Value = DateTime<Tz>> {
        (prop::sample::select(dates), minutes)
            .prop_map(|(d, m)| local(d.year(), d.month(), d.day(), m / 60, m % 60))
    }

    fn any_working_instant() -> impl Strategy<Value = DateTime<Tz>> {
        instant_on(working_dates(), prop_oneof![8u32 * 60..12 * 60, 13u32 * 60..17 * 60])
    }

    proptest! {
        #[test]
        fn prop_non_working_day_adjusts_to_previous_close(
            dt in instant_on(non_working_dates(), 0u32..24 * 60)
        ) {
            let holidays = sample_holidays();
            let result = adjust_to_working_time(&dt, &holidays);
            prop_assert!(result.date_naive() < dt.date_naive());
            prop_assert!(is_working_day(result.date_naive(), &holidays));
            prop_assert_eq!((result.hour(), result.minute()), (17, 0));
            // Nothing in between is a working day.
            let mut d = result.date_naive() + Duration::days(1);
            while d < dt.date_naive() {
                prop_assert!(!is_working_day(d, &holidays));
                d = d + Duration::days(1);
            }
        }

        #[test]
        fn prop_early_morning_adjusts_to_previous_close(
            dt in instant_on(working_dates(), 0u32..8 * 60)
        ) {
            let holidays = sample_holidays();
            let result = adjust_to_working_time(&dt, &holidays);
            prop_assert_eq!(result, previous_working_day_end(&dt, &holidays));
            prop_assert!(result.date_naive() < dt.date_naive());
            prop_assert_eq!((result.hour(), result.minute()), (17, 0));
        }

        #[test]
        fn prop_lunch_adjusts_to_noon(dt in instant_on(working_dates(), 12u32 * 60..13 * 60)) {
            let result = adjust_to_working_time(&dt, &sample_holidays());
            prop_assert_eq!(result.date_naive(), dt.date_naive());
            prop_assert_eq!((result.hour(), result.minute()), (12, 0));
        }

        #[test]
        fn prop_add_days_counts_only_working_days(dt in any_working_instant(), n in 0u32..15) {
            let holidays = sample_holidays();
            let result = add_working_days(&dt, n, &holidays);
            prop_assert_eq!((result.hour(), result.minute()), (dt.hour(), dt.minute()));
            prop_assert!(is_working_day(result.date_naive(), &holidays));
            prop_assert!(!matches!(result.weekday(), Weekday::Sat | Weekday::Sun));
            let mut counted = 0;
            let mut d = dt.date_naive();
            while d < result.date_naive() {
                d = d + Duration::days(1);
                if is_working_day(d, &holidays) {
                    counted += 1;
                }
            }
            prop_assert_eq!(counted, n);
        }

        #[test]
        fn prop_morning_hours_spanning_lunch_skip_it(
            dt in instant_on(working_dates(), 8u32 * 60..12 * 60),
            extra in 1u32..240,
        ) {
            // Enough minutes to cross noon but stay before closing time.
            let minutes = 12 * 60 - minute_of_day(&dt) + extra;
            let result = add_working_hours(&dt, f64::from(minutes) / 60.0, &sample_holidays());
            prop_assert_eq!(result.date_naive(), dt.date_naive());
            prop_assert_eq!(minute_of_day(&result), 13 * 60 + extra);
        }

        #[test]
        fn prop_add_hours_lands_in_working_time(dt in any_working_instant(), hours in 1u32..30) {
            let holidays = sample_holidays();
            let result = add_working_hours(&dt, f64::from(hours), &holidays);
            prop_assert!(result > dt);
            prop_assert!(is_working_day(result.date_naive(), &holidays));
            let minute = minute_of_day(&result);
            prop_assert!(
                (8 * 60 + 1..=12 * 60).contains(&minute) || (13 * 60 + 1..=17 * 60).contains(&minute)
            );
        }
    }
}
