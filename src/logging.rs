use crate::config::AppConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Crates that log every statement or connection at `info`
const QUIET_DEPENDENCIES: &[(&str, &str)] = &[("sqlx", "warn"), ("hyper_util", "warn"), ("reqwest", "warn")];

/// Directive string for `EnvFilter`: the configured level plus quieted dependencies
fn filter_directives(log_level: &str) -> String {
    QUIET_DEPENDENCIES
        .iter()
        .fold(log_level.to_string(), |acc, (krate, level)| {
            format!("{},{}={}", acc, krate, level)
        })
}

/// Install the global subscriber: rolling file output plus colored stdout in
/// text mode, file-only in JSON mode.
///
/// The returned guard must live until shutdown or buffered lines are lost.
/// `RUST_LOG` overrides the configured level.
pub fn init_logging(config: &AppConfig) -> WorkerGuard {
    let file_appender = match config.rotation.as_str() {
        "hourly" => tracing_appender::rolling::hourly(&config.log_dir, &config.log_file),
        "daily" => tracing_appender::rolling::daily(&config.log_dir, &config.log_file),
        _ => tracing_appender::rolling::never(&config.log_dir, &config.log_file),
    };
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(&config.log_level)));
    let registry = tracing_subscriber::registry().with(filter);

    if config.use_json {
        // Structured fields (user_id, transaction_id, settlement_id) become JSON keys
        let file_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(false)
            .with_writer(non_blocking)
            .with_ansi(false);
        registry.with(file_layer).init();
    } else {
        let file_layer = fmt::layer()
            .with_target(false)
            .with_writer(non_blocking)
            .with_ansi(false);
        let stdout_layer = fmt::layer().with_target(false).with_ansi(true);
        registry.with(file_layer).with(stdout_layer).init();
    }

    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_quiets_dependencies() {
        let directives = filter_directives("debug");
        assert!(directives.starts_with("debug,"));
        assert!(directives.contains("sqlx=warn"));
        assert!(directives.contains("reqwest=warn"));
        assert!(EnvFilter::try_new(&directives).is_ok());
    }
}
