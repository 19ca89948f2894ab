//! Layered service configuration.
//!
//! Sources, lowest precedence first: built-in defaults, an optional YAML file,
//! `WORKDAYS__*` environment variables (nested keys joined with `__`), then
//! CLI overrides.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use url::Url;
use workday_engine::RetryPolicy;

/// Upstream list of public holidays.
pub const DEFAULT_HOLIDAYS_URL: &str = "https://content.capta.co/Recruitment/WorkingDays.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub holidays: HolidaysConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HolidaysConfig {
    pub url: String,
    /// Per-attempt request timeout.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    pub max_attempts: u32,
    /// Wait after attempt `n` is `backoff_base * n²`.
    #[serde(with = "humantime_serde")]
    pub backoff_base: Duration,
}

impl Default for HolidaysConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            url: DEFAULT_HOLIDAYS_URL.to_string(),
            timeout: Duration::from_secs(8),
            max_attempts: policy.max_attempts,
            backoff_base: policy.base_delay,
        }
    }
}

impl HolidaysConfig {
    /// # Errors
    ///
    /// Fails if `url` is not an absolute URL.
    pub fn source_url(&self) -> anyhow::Result<Url> {
        Url::parse(&self.url).with_context(|| format!("invalid holidays.url '{}'", self.url))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: self.backoff_base,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level applied to this workspace's crates when `RUST_LOG` is unset.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl AppConfig {
    pub const ENV_PREFIX: &'static str = "WORKDAYS__";

    /// Merge defaults, the optional YAML file and the environment.
    ///
    /// # Errors
    ///
    /// Fails if `path` is given but is not a file, or if any layer holds a
    /// value of the wrong shape.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

        if let Some(path) = path {
            if !path.is_file() {
                bail!("config file does not exist: {}", path.display());
            }
            figment = figment.merge(Yaml::file(path));
        }

        let config: Self = figment
            .merge(Env::prefixed(Self::ENV_PREFIX).split("__"))
            .extract()
            .context("invalid configuration")?;
        config.holidays.source_url()?;
        Ok(config)
    }

    pub fn apply_cli_overrides(&mut self, port: Option<u16>) {
        if let Some(port) = port {
            self.server.bind_addr.set_port(port);
        }
    }
}
