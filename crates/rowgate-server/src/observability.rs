//! Log subscriber setup.
//!
//! The subscriber is installed before configuration is read so config
//! errors are logged, then re-leveled from `logging.level`.

use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

const STARTUP_LEVEL: &str = "info";

static FILTER: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();

/// Installs the global subscriber. `RUST_LOG`, when valid, overrides the
/// startup level and any level applied later.
pub fn init_tracing() {
    let filter = rust_log_filter().unwrap_or_else(|| EnvFilter::new(STARTUP_LEVEL));
    let (filter, handle) = reload::Layer::new(filter);
    if FILTER.set(handle).is_err() {
        return;
    }

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init();
}

/// Switches the active filter to `level` unless `RUST_LOG` is in charge.
pub fn apply_logging_level(level: &str) {
    if rust_log_filter().is_some() {
        return;
    }
    let Some(handle) = FILTER.get() else {
        return;
    };
    if let Err(e) = handle.reload(EnvFilter::new(level)) {
        tracing::warn!(error = %e, level, "cannot change log level");
    }
}

fn rust_log_filter() -> Option<EnvFilter> {
    std::env::var_os(EnvFilter::DEFAULT_ENV)?;
    EnvFilter::try_from_default_env().ok()
}
