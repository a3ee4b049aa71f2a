//! Tracing setup for tests
//!
//! Tests that exercise the reconciliation paths emit tracing events; this
//! installs a subscriber once per process so those events show up under
//! `--nocapture` without double-init panics.

use once_cell::sync::Lazy;
use tracing_subscriber::EnvFilter;

static TRACING: Lazy<()> = Lazy::new(|| {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
});

/// Installs the test tracing subscriber (idempotent)
pub fn init_test_tracing() {
    Lazy::force(&TRACING);
}
