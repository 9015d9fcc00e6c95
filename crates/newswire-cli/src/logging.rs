use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Installs the stderr log subscriber once.
///
/// The level comes from `RUST_LOG` and defaults to `warn`, so failover and
/// degraded-mode warnings show up without drowning the JSON on stdout.
/// Example: `RUST_LOG=newswire_core=debug`.
pub fn init() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .init();
    });
}
