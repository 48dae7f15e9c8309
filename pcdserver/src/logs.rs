//! Initialisation du logging (tracing)

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialise le subscriber global de tracing.
///
/// Le niveau par défaut est `info` ; la variable `RUST_LOG` le surcharge
/// (ex: `RUST_LOG=pcdcatalog=debug`).
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();
}
