//! # workday-engine
//!
//! Working-day and working-hour arithmetic for a fixed regional calendar.
//!
//! Answers "given a reference instant, N working days and/or N working hours,
//! what is the resulting instant?" under Monday to Friday, 08:00 to 17:00
//! with a 12:00 to 13:00 unpaid break, in `America/Bogota` local time,
//! excluding a holiday set fetched from an external source.
//!
//! ## Modules
//!
//! - [`arithmetic`] — normalization, day and hour advancement, the top-level calculation
//! - [`calendar`] — working-day and working-minute predicates, boundary walkers
//! - [`holidays`] — the immutable holiday set and date normalization
//! - [`provider`] — fetching and caching the holiday set
//! - [`retry`] — bounded retry with quadratic backoff
//! - [`error`] — Error types

pub mod arithmetic;
pub mod calendar;
pub mod error;
pub mod holidays;
pub mod provider;
pub mod retry;

pub use arithmetic::{
    add_working_days, add_working_hours, adjust_to_working_time, calculate_working_date,
    parse_start, CalculationRequest,
};
pub use calendar::{
    is_working_day, is_working_minute, next_working_day_start, previous_working_day_end,
    BUSINESS_TZ,
};
pub use error::{FetchError, WorkdayError};
pub use holidays::HolidaySet;
pub use provider::{HolidaySetProvider, HolidaySource, HttpHolidaySource};
pub use retry::{RetryPolicy, Sleeper, TokioSleeper};
