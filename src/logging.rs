//! Logging setup
//!
//! The crate logs through the `log` facade: cycle phases at `debug`, single
//! marker operations at `trace`, degraded projections at `warn`. Hosts bring
//! their own logger; with the `debug` feature `init` installs `env_logger`.

/// Installs `env_logger`, configured from `RUST_LOG`. Later calls are ignored.
#[cfg(feature = "debug")]
pub fn init() {
    let _ = env_logger::Builder::from_default_env()
        .format_timestamp_millis()
        .try_init();
}

/// Without the `debug` feature there is no bundled logger.
#[cfg(not(feature = "debug"))]
pub fn init() {}
