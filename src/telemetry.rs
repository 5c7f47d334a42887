use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Structured logging with environment-based filtering.
/// `RUST_LOG` overrides `default_filter`, e.g. `RUST_LOG=debug`.
pub fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();
}
