use tracing_subscriber::EnvFilter;

/// Initializes a global `tracing` subscriber with an env-filter, the way
/// the template's binaries do at startup. Safe to call more than once;
/// subsequent calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
