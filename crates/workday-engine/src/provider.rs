//! Retrieval and caching of the holiday set.
//!
//! [`HolidaySetProvider`] is the only component that performs I/O. It asks a
//! [`HolidaySource`] for the raw payload, normalizes it into a
//! [`HolidaySet`], retries failed attempts under a [`RetryPolicy`] and keeps
//! the first successful result for the provider's lifetime.
//!
//! The cache is a write-once cell. Callers racing before the first success
//! each run their own fetch; whichever stores its set first wins and every
//! later call returns that set without touching the source.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde_json::Value;
use tracing::{debug, error, info, instrument};
use url::Url;

use crate::error::FetchError;
use crate::holidays::HolidaySet;
use crate::retry::{RetryPolicy, Sleeper, TokioSleeper};

/// Characters of an unexpected response body kept in logs.
const BODY_SNIPPET_LEN: usize = 200;

/// Dates echoed in the success log line.
const SAMPLE_LEN: usize = 3;

/// Where raw holiday payloads come from.
#[async_trait]
pub trait HolidaySource: Send + Sync {
    /// Fetch the payload once. Implementations do not retry.
    async fn fetch_raw(&self) -> Result<Value, FetchError>;

    /// Human-readable location for logs.
    fn describe(&self) -> String;
}

// ── HTTP source ─────────────────────────────────────────────────────────────

/// `GET`s a JSON document over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpHolidaySource {
    client: reqwest::Client,
    url: Url,
}

impl HttpHolidaySource {
    /// Build a source with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] if the HTTP client cannot be built.
    pub fn new(url: Url, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                error!(?e, "HttpHolidaySource: failed to create HTTP client");
                FetchError::Client(e.to_string())
            })?;
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl HolidaySource for HttpHolidaySource {
    async fn fetch_raw(&self) -> Result<Value, FetchError> {
        let response = self
            .client
            .get(self.url.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                error!(?e, timeout = e.is_timeout(), "holiday request failed");
                FetchError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(
                status = status.as_u16(),
                body = %snippet(&body),
                "holiday fetch non-OK"
            );
            return Err(FetchError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await.map_err(|e| {
            error!(?e, "failed to read holiday response body");
            FetchError::Transport(e.to_string())
        })?;

        serde_json::from_slice(&bytes).map_err(|e| {
            error!(
                error = %e,
                body = %snippet(&String::from_utf8_lossy(&bytes)),
                "holiday response is not JSON"
            );
            FetchError::InvalidFormat(e.to_string())
        })
    }

    fn describe(&self) -> String {
        self.url.to_string()
    }
}

fn snippet(body: &str) -> String {
    body.chars().take(BODY_SNIPPET_LEN).collect()
}

// ── Provider ────────────────────────────────────────────────────────────────

/// Fetches the holiday set once and serves it from memory afterwards.
pub struct HolidaySetProvider {
    source: Arc<dyn HolidaySource>,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    cached: OnceLock<Arc<HolidaySet>>,
}

impl std::fmt::Debug for HolidaySetProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HolidaySetProvider")
            .field("source", &self.source.describe())
            .field("policy", &self.policy)
            .field("cached", &self.cached.get().map(|h| h.len()))
            .finish_non_exhaustive()
    }
}

impl HolidaySetProvider {
    /// A provider with the default retry policy, sleeping on the tokio timer.
    pub fn new(source: Arc<dyn HolidaySource>) -> Self {
        Self {
            source,
            policy: RetryPolicy::default(),
            sleeper: Arc::new(TokioSleeper),
            cached: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// The cached set, if a fetch has already succeeded.
    pub fn cached(&self) -> Option<Arc<HolidaySet>> {
        self.cached.get().cloned()
    }

    /// Return the holiday set, fetching it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Exhausted`] once every attempt failed; the last
    /// attempt's error is carried inside. Failures are not cached.
    #[instrument(skip(self), fields(source = %self.source.describe()))]
    pub async fn fetch(&self) -> Result<Arc<HolidaySet>, FetchError> {
        if let Some(holidays) = self.cached.get() {
            debug!(count = holidays.len(), "using cached holidays");
            return Ok(Arc::clone(holidays));
        }

        let holidays = self
            .policy
            .run(self.sleeper.as_ref(), |attempt| self.attempt(attempt))
            .await
            .map_err(|exhausted| {
                error!(
                    attempts = exhausted.attempts,
                    error = %exhausted.last_error,
                    "giving up on holidays"
                );
                FetchError::Exhausted {
                    attempts: exhausted.attempts,
                    last: Box::new(exhausted.last_error),
                }
            })?;

        Ok(Arc::clone(self.cached.get_or_init(|| Arc::new(holidays))))
    }

    async fn attempt(&self, attempt: u32) -> Result<HolidaySet, FetchError> {
        info!(attempt, "holidays fetch start");
        let payload = self.source.fetch_raw().await?;

        let holidays = HolidaySet::from_json(&payload).map_err(|e| {
            error!(attempt, error = %e, "holiday payload rejected");
            e
        })?;

        let sample: Vec<String> = holidays
            .iter()
            .take(SAMPLE_LEN)
            .map(|d| d.to_string())
            .collect();
        info!(total = holidays.len(), ?sample, "holidays fetch ok");
        Ok(holidays)
    }
}
