//! The `GET /working-days` endpoint.
//!
//! Validates the query, fetches the holiday set once per request through the
//! shared provider and runs the calculation.

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, RawQuery, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, instrument, warn};
use workday_engine::{parse_start, CalculationRequest, FetchError, HolidaySetProvider};

pub const WORKING_DAYS_PATH: &str = "/working-days";

/// Largest accepted `days`, roughly 38 years of working days.
pub const MAX_DAYS: u32 = 10_000;

/// Largest accepted `hours`, the same span as [`MAX_DAYS`] at 8 hours a day.
pub const MAX_HOURS: u32 = MAX_DAYS * 8;

#[derive(Debug, Clone)]
pub struct AppState {
    pub provider: Arc<HolidaySetProvider>,
}

impl AppState {
    pub fn new(provider: HolidaySetProvider) -> Self {
        Self {
            provider: Arc::new(provider),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(WORKING_DAYS_PATH, get(working_days))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
}

// ── DTOs ────────────────────────────────────────────────────────────────────

/// Raw query parameters; everything is validated by [`validate`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkingDaysQuery {
    pub days: Option<String>,
    pub hours: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingDateResponse {
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

// ── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidParameters(String),

    #[error("{0}")]
    InternalServerError(String),
}

impl ApiError {
    fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidParameters(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidParameters(_) => "InvalidParameters",
            Self::InternalServerError(_) => "InternalServerError",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidParameters(_) => StatusCode::BAD_REQUEST,
            Self::InternalServerError(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<FetchError> for ApiError {
    fn from(e: FetchError) -> Self {
        Self::InternalServerError(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.code().to_string(),
            message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

// ── Validation ──────────────────────────────────────────────────────────────

/// Turn raw query parameters into a calculation request.
///
/// `raw` is the undecoded query string, used only to tell "no parameters at
/// all" apart from "no usable parameters".
///
/// # Errors
///
/// Returns [`ApiError::InvalidParameters`] describing the first problem found.
pub fn validate(
    raw: Option<&str>,
    query: &WorkingDaysQuery,
) -> Result<CalculationRequest, ApiError> {
    if raw.is_none_or(str::is_empty) {
        return Err(ApiError::invalid("No query parameters provided"));
    }

    let days = present(query.days.as_deref());
    let hours = present(query.hours.as_deref());
    if days.is_none() && hours.is_none() {
        return Err(ApiError::invalid(
            r#"At least one of "days" or "hours" must be provided"#,
        ));
    }

    let days = days
        .map(|v| parse_count("days", v, MAX_DAYS))
        .transpose()?
        .unwrap_or(0);
    let hours = hours
        .map(|v| parse_count("hours", v, MAX_HOURS))
        .transpose()?
        .unwrap_or(0);
    if days == 0 && hours == 0 {
        return Err(ApiError::invalid(
            r#"At least one of "days" or "hours" must be greater than zero"#,
        ));
    }

    let start = present(query.date.as_deref())
        .map(parse_utc_date)
        .transpose()?;

    Ok(CalculationRequest { start, days, hours })
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_count(name: &str, value: &str, max: u32) -> Result<u32, ApiError> {
    let count = value
        .parse::<u32>()
        .map_err(|_| ApiError::invalid(format!(r#""{name}" must be a positive integer"#)))?;
    if count > max {
        return Err(ApiError::invalid(format!(r#""{name}" must not exceed {max}"#)));
    }
    Ok(count)
}

fn parse_utc_date(value: &str) -> Result<DateTime<Utc>, ApiError> {
    if !value.ends_with('Z') {
        return Err(ApiError::invalid(
            r#""date" must be in UTC format with Z suffix (ISO 8601)"#,
        ));
    }
    parse_start(value).map_err(|_| ApiError::invalid(r#""date" must be a valid ISO 8601 date"#))
}

/// `YYYY-MM-DDTHH:MM:SS.mmmZ`
pub fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ── Handler ─────────────────────────────────────────────────────────────────

#[instrument(skip_all)]
async fn working_days(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
    query: Result<Query<WorkingDaysQuery>, QueryRejection>,
) -> Result<Json<WorkingDateResponse>, ApiError> {
    let request = query
        .map_err(|e| ApiError::invalid(e.body_text()))
        .and_then(|Query(query)| validate(raw.as_deref(), &query))
        .inspect_err(|e| warn!(error = %e, raw_query = ?raw, "validation error"))?;

    let holidays = state.provider.fetch().await.map_err(|e| {
        error!(error = %e, "holiday retrieval failed");
        ApiError::from(e)
    })?;

    info!(
        start = ?request.start,
        days = request.days,
        hours = request.hours,
        "calculating working date"
    );
    let date = format_instant(request.evaluate(&holidays));
    info!(%date, "result date calculated");

    Ok(Json(WorkingDateResponse { date }))
}
