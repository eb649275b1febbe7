//! Log threshold handling and the stderr subscriber used outside the TUI.
//!
//! The TUI never installs a logger: anything written to stderr would tear the
//! alternate screen, so there the activity log panel is the only sink.

pub use crate::error_classifier::LogLevel;
use std::env;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Threshold taken from `RUST_LOG`, defaulting to info.
pub fn get_rust_log_level() -> LogLevel {
    let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    parse_rust_log_level(&rust_log)
}

/// Accepts `level`, `crate=level` and comma separated lists; the first directive wins.
pub fn parse_rust_log_level(rust_log: &str) -> LogLevel {
    let first_directive = rust_log.split(',').next().unwrap_or(rust_log);
    let level_str = first_directive
        .rsplit('=')
        .next()
        .unwrap_or(first_directive)
        .trim()
        .to_lowercase();

    match level_str.as_str() {
        "trace" => LogLevel::Trace,
        "debug" => LogLevel::Debug,
        "info" => LogLevel::Info,
        "warn" | "warning" => LogLevel::Warn,
        "error" => LogLevel::Error,
        _ => LogLevel::Info,
    }
}

pub fn should_log(event_level: LogLevel, threshold: LogLevel) -> bool {
    event_level >= threshold
}

pub fn should_log_with_env(event_level: LogLevel) -> bool {
    should_log(event_level, get_rust_log_level())
}

/// Filter used when `RUST_LOG` is unset or unparsable.
const DEFAULT_FILTER: &str = "portfolio_view=info";

/// `RUST_LOG` directives, or [`DEFAULT_FILTER`].
fn env_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// Routes `log` macros to a stderr subscriber filtered by `RUST_LOG`.
///
/// Calling it more than once is harmless; only the first registration sticks.
pub fn init_stderr_logger() {
    let rust_log = env::var("RUST_LOG").ok();
    let subscriber = tracing_subscriber::registry()
        .with(env_filter(rust_log.as_deref()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .with_target(true)
                .without_time(),
        );
    // Also installs the `log` to `tracing` bridge.
    if subscriber.try_init().is_err() {
        log::debug!("stderr logger already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rust_log_level() {
        assert_eq!(parse_rust_log_level("debug"), LogLevel::Debug);
        assert_eq!(parse_rust_log_level("info"), LogLevel::Info);
        assert_eq!(parse_rust_log_level("warn"), LogLevel::Warn);
        assert_eq!(parse_rust_log_level("error"), LogLevel::Error);
        assert_eq!(parse_rust_log_level("trace"), LogLevel::Trace);

        // Module-specific formats
        assert_eq!(parse_rust_log_level("portfolio_view=debug"), LogLevel::Debug);
        assert_eq!(
            parse_rust_log_level("portfolio_view=debug,reqwest=info"),
            LogLevel::Debug
        );

        assert_eq!(parse_rust_log_level("invalid"), LogLevel::Info);
    }

    #[test]
    fn test_should_log() {
        assert!(should_log(LogLevel::Error, LogLevel::Debug));
        assert!(should_log(LogLevel::Warn, LogLevel::Warn));
        assert!(!should_log(LogLevel::Debug, LogLevel::Error));
        assert!(!should_log(LogLevel::Info, LogLevel::Error));
    }

    #[test]
    fn test_env_filter_falls_back_to_crate_info() {
        assert_eq!(env_filter(None).to_string(), DEFAULT_FILTER);
        assert_eq!(
            env_filter(Some("portfolio_view=debug")).to_string(),
            "portfolio_view=debug"
        );
    }
}
