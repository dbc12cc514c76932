//! Tracing subscriber setup.

use checkconf_config::{LogFormat, LogLevel, LoggingSettings};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install the global subscriber. Events go to stderr.
///
/// `RUST_LOG` takes precedence over the configured level when it is set.
pub fn init_tracing(settings: &LoggingSettings, quiet: bool) {
    let level = effective_level(settings.level, quiet);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match settings.format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };
    if let Err(error) = installed {
        eprintln!("warning: tracing subscriber not installed: {error}");
    }
}

/// `--quiet` caps output at errors.
pub const fn effective_level(level: LogLevel, quiet: bool) -> LogLevel {
    if quiet { LogLevel::Error } else { level }
}
