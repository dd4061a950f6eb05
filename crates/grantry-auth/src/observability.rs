//! Tracing initialization with a configurable and reloadable log level.

use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

static LOG_RELOAD_HANDLE: OnceLock<reload::Handle<EnvFilter, tracing_subscriber::Registry>> =
    OnceLock::new();

/// Installs the global subscriber at `info`.
///
/// See [`init_tracing_with_level`].
pub fn init_tracing() -> bool {
    init_tracing_with_level("info")
}

/// Installs the global subscriber.
///
/// `RUST_LOG` wins over `level` when set. Returns `true` if this call
/// installed the subscriber. Later calls, or calls after a host installed
/// its own subscriber, return `false` and leave the existing one in place;
/// [`apply_logging_level`] only controls a subscriber installed here.
pub fn init_tracing_with_level(level: &str) -> bool {
    let base_filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|_| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(level));

    let (reload_layer, handle) = reload::Layer::new(base_filter);

    let installed = tracing_subscriber::registry()
        .with(reload_layer)
        .with(fmt::layer())
        .try_init()
        .is_ok();
    if installed {
        let _ = LOG_RELOAD_HANDLE.set(handle);
    }
    installed
}

/// Applies a new log level at runtime. Returns `false` if tracing was not
/// initialized through this module.
pub fn apply_logging_level(level: &str) -> bool {
    LOG_RELOAD_HANDLE.get().is_some_and(|handle| {
        handle
            .modify(|filter| {
                *filter = EnvFilter::new(level);
            })
            .is_ok()
    })
}
