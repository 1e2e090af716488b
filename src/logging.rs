//! Logging setup for the `assetstore` binary

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install a stderr subscriber
///
/// `RUST_LOG` wins over `default_filter`. Calling this more than once is a no-op.
pub fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_ansi(false),
        )
        .try_init();
}
