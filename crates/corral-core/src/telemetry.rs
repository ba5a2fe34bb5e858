//! Tracing initialisation.

/// Install a fmt subscriber filtered by `RUST_LOG`, falling back to `default_directive`.
///
/// Does nothing when a global subscriber is already set, so tests and
/// embedding applications may call it freely.
pub fn init_tracing(default_directive: &str) {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
