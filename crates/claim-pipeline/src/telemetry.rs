//! Tracing subscriber setup.

use claim_config::LoggingConfig;

/// Environment variable that overrides the configured log filter.
pub const LOG_ENV: &str = "CLAIMCHECK_LOG";

/// Install a global `fmt` subscriber.
///
/// The filter comes from `CLAIMCHECK_LOG` when set, otherwise from
/// `logging.filter`.
///
/// # Errors
///
/// Returns an error if the configured filter does not parse or a global
/// subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = match tracing_subscriber::EnvFilter::try_from_env(LOG_ENV) {
        Ok(filter) => filter,
        Err(_) => tracing_subscriber::EnvFilter::try_new(&config.filter).map_err(|error| {
            anyhow::anyhow!("invalid log filter '{}': {error}", config.filter)
        })?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
