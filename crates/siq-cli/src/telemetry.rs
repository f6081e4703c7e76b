//! Console logging.
//!
//! Events go to stderr so that generated identifiers on stdout stay
//! pipeable. The filter comes from `RUST_LOG` and defaults to `warn`:
//!
//! ```bash
//! RUST_LOG=siq=debug siq generate -n 10
//! ```

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_telemetry() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_line_number(true)
                .with_target(false)
                .with_file(true),
        )
        .try_init()?;
    Ok(())
}
