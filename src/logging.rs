// src/logging.rs

//! Stderr logging. Stdout belongs to the command's output.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use crate::cli::LogLevel;

/// Filter directives when `--log-level` is absent, e.g.
/// `TERMEXEC_LOG=warn,termexec::exec=debug`.
pub const LOG_ENV_VAR: &str = "TERMEXEC_LOG";

pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(filter_for(cli_level))
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing log subscriber: {e}"))
}

/// The flag wins; a missing or unparsable variable means `info`.
fn filter_for(cli_level: Option<LogLevel>) -> EnvFilter {
    match cli_level {
        Some(level) => EnvFilter::new(directive(level)),
        None => EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info")),
    }
}

fn directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn cli_level_sets_the_maximum() {
        assert_eq!(
            filter_for(Some(LogLevel::Debug)).max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
        assert_eq!(
            filter_for(Some(LogLevel::Error)).max_level_hint(),
            Some(LevelFilter::ERROR)
        );
    }
}
