//! Error types for workday-engine operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkdayError {
    #[error("Empty holiday set")]
    EmptyHolidaySet,

    #[error("Invalid datetime: {0}")]
    InvalidDatetime(String),
}

/// Failures raised while retrieving the holiday reference data.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Holidays HTTP client error: {0}")]
    Client(String),

    #[error("Holidays transport error: {0}")]
    Transport(String),

    #[error("Holidays HTTP {0}")]
    Status(u16),

    #[error("Invalid holidays data format: {0}")]
    InvalidFormat(String),

    #[error("Empty holidays after parsing")]
    NoValidDates,

    #[error("Failed to fetch holidays data after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: Box<FetchError> },
}

pub type Result<T> = std::result::Result<T, WorkdayError>;
