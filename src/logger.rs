//! Logging setup.
//!
//! Logs go to stderr so console replies on stdout stay readable. `RUST_LOG`
//! wins when set; otherwise `[session] log_level` from the config applies.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::error::AppError;

/// Install the global subscriber. Call once, after config is loaded.
pub fn init(log_level: &str) -> Result<(), AppError> {
    let level = parse_level(log_level)?;
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env()
        .map_err(|e| AppError::Logger(format!("invalid RUST_LOG: {e}")))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| AppError::Logger(format!("subscriber already installed: {e}")))
}

fn parse_level(log_level: &str) -> Result<LevelFilter, AppError> {
    let trimmed = log_level.trim();
    if trimmed.is_empty() {
        return Err(AppError::Logger("[session] log_level must not be empty".into()));
    }
    trimmed
        .parse::<LevelFilter>()
        .map_err(|_| AppError::Logger(format!("unrecognised [session] log_level '{log_level}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_levels_parse() {
        for l in ["error", "warn", "info", "debug", "trace", "off", " INFO "] {
            assert!(parse_level(l).is_ok(), "expected '{l}' to be valid");
        }
        assert_eq!(parse_level("debug").unwrap(), LevelFilter::DEBUG);
    }

    #[test]
    fn bad_config_level_rejected_before_install() {
        for l in ["verbose", "", "INFO_LEVEL"] {
            match init(l) {
                Err(AppError::Logger(msg)) => assert!(msg.contains("log_level"), "{msg}"),
                other => panic!("expected log_level error for '{l}', got {other:?}"),
            }
        }
    }

    #[test]
    fn init_installs_once() {
        // Another test in this process may have installed it first.
        match init("info") {
            Ok(()) => {}
            Err(AppError::Logger(msg)) if msg.contains("already installed") => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
        assert!(matches!(init("info"), Err(AppError::Logger(_))));
    }
}
