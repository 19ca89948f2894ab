use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

/// All workspace crate targets that should receive log output.
const CRATE_TARGETS: &[&str] = &["workday_server", "workday_engine", "tower_http"];

/// Initialize tracing from config and CLI verbosity.
///
/// Verbosity wins over the configured level when given:
/// - 0 (none) -> `config.level`
/// - 1 (-v)   -> info
/// - 2 (-vv)  -> debug
/// - 3+ (-vvv)-> trace
///
/// `RUST_LOG` env var overrides both if set. Output goes to stderr.
pub fn init(config: &LoggingConfig, verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(level_for(config, verbosity))));

    match config.format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
    }
}

fn level_for(config: &LoggingConfig, verbosity: u8) -> &str {
    match verbosity {
        0 => &config.level,
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn default_filter(level: &str) -> String {
    CRATE_TARGETS
        .iter()
        .map(|t| format!("{t}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}
