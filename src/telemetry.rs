//! Logging initialization.

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT_ONCE: Once = Once::new();

/// Installs the global `tracing` subscriber.
///
/// Events go to stderr so stdout carries only response lines. `filter` uses
/// `EnvFilter` directive syntax (`info`, `ordersvc=debug`); an unparsable
/// filter falls back to `info`. Later calls are no-ops.
pub fn init(filter: &str) {
    INIT_ONCE.call_once(|| {
        let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
        // A subscriber installed by an embedding program wins.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .try_init();
    });
}
