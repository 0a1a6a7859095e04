//! Diagnostic logging
//!
//! Stdout carries the result stream, so diagnostics go to stderr.

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "ISOTEST_LOG";

/// Install the stderr subscriber. Filter from `ISOTEST_LOG`, `warn` otherwise.
///
/// Calling it again, or after another subscriber was installed, does nothing.
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_file(true)
                .with_line_number(true),
        )
        .try_init();
}
