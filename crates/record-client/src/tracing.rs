/// Initializes the tracing/logging infrastructure for an application.
///
/// Structured logging via the `tracing` crate with environment-based
/// filtering: set `RUST_LOG` to control verbosity, e.g.
///
/// - `RUST_LOG=info` - lifecycle and operation outcomes
/// - `RUST_LOG=debug` - individual store round trips and payload sizes
/// - `RUST_LOG=record_client=debug` - debug for this crate only
///
/// # Example
///
/// ```ignore
/// setup_tracing();
/// tracing::info!("Application started");
/// ```
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}
