//! Structured logging setup
//!
//! The library only emits `tracing` events. Binaries call [`init`] once at
//! startup; levels come from `RUST_LOG`, for example:
//! - `RUST_LOG=info` - pattern-level events
//! - `RUST_LOG=handoff=trace` - task lifecycle transitions as well

use std::sync::Once;

use tracing_subscriber::EnvFilter;

static INIT_LOGGER: Once = Once::new();

/// Install the global fmt subscriber (subsequent calls are no-ops)
pub fn init() {
    INIT_LOGGER.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        if tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_thread_names(true)
            .try_init()
            .is_ok()
        {
            tracing::debug!("structured logging initialized");
        }
    });
}

/// Initialize logging for tests, capturing output per test
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
