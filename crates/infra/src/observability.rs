//! Tracing bootstrap
//!
//! Installs a `tracing` subscriber with an env-filter so services and
//! repositories emit structured logs. Call once at process start; repeat
//! calls are ignored.

use tracing_subscriber::{fmt, EnvFilter};

/// Initialise the global tracing subscriber.
///
/// The filter honours `RUST_LOG`, defaulting to `info` when unset. Safe to
/// call more than once; only the first call installs the subscriber.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}
