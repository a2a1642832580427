//! script-voice-relay server
//!
//! Reads configuration from the environment (and `.env`), sets up logging,
//! then serves the REST API until SIGTERM or Ctrl+C.

use script_voice_relay::{Config, Orchestrator, api, shutdown_signal};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    // RUST_LOG wins over LOG_LEVEL
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level).unwrap_or_else(|e| {
            eprintln!(
                "WARN: LOG_LEVEL='{}' is not a valid tracing filter ({e}); falling back to 'info'",
                config.log_level
            );
            EnvFilter::new("info")
        }),
    };
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    if config.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.api.bind_address,
        "script-voice-relay starting"
    );

    let orchestrator = Arc::new(Orchestrator::new(config)?);
    api::start_api_server(orchestrator, shutdown_signal()).await?;

    Ok(())
}
