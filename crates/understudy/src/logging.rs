//! Log capture for tests that use doubles
//!
//! Doubles log through `tracing`: configuration at `debug`, dispatch at
//! `trace`, failures at `warn`. [`init_test_logging`] routes those events to
//! the libtest output capture so they show up next to a failing test.

use tracing_subscriber::EnvFilter;

/// Output format of the test subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable, one line per event
    #[default]
    Compact,
    /// One JSON object per event
    Json,
}

/// Filter used when `RUST_LOG` is unset or invalid
pub const DEFAULT_DIRECTIVE: &str = "warn";

/// Install the compact test subscriber.
///
/// Safe to call from every test: only the first call installs a subscriber.
pub fn init_test_logging() {
    init_test_logging_with(LogFormat::Compact);
}

/// Install the test subscriber with the given format.
///
/// Returns `false` when a global subscriber was already installed.
pub fn init_test_logging_with(format: LogFormat) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(build_env_filter())
        .with_test_writer()
        .with_target(true);

    let installed = match format {
        LogFormat::Compact => builder.compact().without_time().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.is_ok()
}

fn build_env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}
