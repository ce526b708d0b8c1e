//! Process-wide `tracing` subscriber.

use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber.
///
/// Level defaults to `info`; `RUST_LOG` overrides it (e.g. `RUST_LOG=ar_garden=trace`
/// to see every frame).
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // A second init (tests, repeated calls) is harmless; ignore the error.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
