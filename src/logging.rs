//! Logging setup
//!
//! Logs go to stderr; stdout is reserved for joined records. `RUST_LOG`
//! overrides the default `docjoin=info` filter.

use tracing_subscriber::EnvFilter;

pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docjoin=info"));
    // A subscriber may already be installed (tests, embedding tools)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
