//! Shared setup for the pathfinder binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Log to stderr at `info`, or `debug` when `verbose`; `RUST_LOG` overrides both.
pub fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
