// src/logging.rs

use tracing_subscriber::EnvFilter;

/// Install the stderr log subscriber.
///
/// Defaults to `info`; `RUST_LOG` overrides it. Stdout is left alone
/// because the report may be printed there.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
