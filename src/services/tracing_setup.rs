//! Tracing subscriber setup
//!
//! Shared tracing configuration used by both the main application and
//! tests. Logs go to a file, never the terminal (the terminal belongs to
//! the UI).

use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the global tracing subscriber with file logging.
///
/// Environment-based filtering (RUST_LOG) applies, with INFO as the
/// default. Returns false if the log file could not be created; the app
/// runs without logging rather than failing to start.
pub fn init_global(log_file_path: &Path) -> bool {
    let log_file = match File::create(log_file_path) {
        Ok(file) => file,
        Err(_) => return false,
    };
    build_subscriber(log_file).init();
    true
}

/// Build a subscriber with file logging.
///
/// This is the core subscriber configuration shared between production and
/// tests.
pub fn build_subscriber(log_file: File) -> impl tracing::Subscriber + Send + Sync {
    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let fmt_layer = fmt::layer().with_writer(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
}
