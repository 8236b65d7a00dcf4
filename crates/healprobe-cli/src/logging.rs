//! Log subscriber setup
//!
//! Logs go to stderr. `HEALPROBE_LOG` takes precedence over `-v`/`-q`.

use tracing_subscriber::EnvFilter;

use crate::config::{CliConfig, LOG_ENV};

/// Filter from `HEALPROBE_LOG`, else from the configured verbosity
#[must_use]
pub fn env_filter(config: &CliConfig) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(config.verbosity.log_filter()))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init_logging(config: &CliConfig) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .with_writer(std::io::stderr)
        .with_target(config.verbosity.is_debug());

    let _ = if config.log_json {
        builder.json().try_init()
    } else {
        builder.with_ansi(config.color.should_color()).try_init()
    };
}
