//! Subscriber setup for the binaries. The library only emits events.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "PRIMER_LOG";

/// Error from installing the global subscriber, as tracing-subscriber reports it.
pub type InitError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Install a stderr fmt subscriber. `PRIMER_LOG` wins over `default_level`.
pub fn init(default_level: &str) -> Result<(), InitError> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
}
