//! Tracing subscriber setup.

use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError, EnvFilter,
};

use crate::config::LogFormat;

/// Installs the global subscriber. Filtering follows `RUST_LOG`, defaulting
/// to `info`.
pub fn init_tracing(format: LogFormat) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with((format == LogFormat::Json).then(|| fmt::layer().with_target(false).json()))
        .with((format == LogFormat::Text).then(|| fmt::layer()))
        .try_init()
}
