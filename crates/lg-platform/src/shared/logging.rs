//! Structured Logging Configuration
//!
//! JSON output for production (`LOG_FORMAT=json`), human-readable text
//! otherwise. Level filtering via `RUST_LOG` (default: info).

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Initialize logging for the given service name.
pub fn init_logging(_service_name: &str) {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if log_format.eq_ignore_ascii_case("json") {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_target(true)
                    .flatten_event(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false)
                    .with_ansi(true),
            )
            .init();
    }
}
