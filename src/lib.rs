//! # script-voice-relay
//!
//! Drives a remote browser-automation agent through a text-to-speech web
//! application, then finds the audio it produced, downloads it and
//! republishes it to object storage behind a time-limited URL.
//!
//! The agent reports no reliable handle to the audio it generated, so the
//! produced item is recovered by diffing the speech account's history
//! before and after the job. See [`resolver`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use script_voice_relay::{Config, EnhanceRequest, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let orchestrator = Orchestrator::new(Config::from_env()?)?;
//!
//!     let response = orchestrator
//!         .enhance(EnhanceRequest {
//!             script: "Welcome back to the show.".into(),
//!             voice_id: None,
//!         })
//!         .await?;
//!
//!     println!("{}: {:?}", response.message, response.s3_audio_url);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Remote agent job submission, lookup and completion waiting
pub mod agent;
/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Scraping identifiers out of agent output
pub mod inspect;
/// The enhance-and-voice workflow
pub mod orchestrator;
/// Fixed-interval polling with a deadline
pub mod poll;
/// Matching a job to the history item it produced
pub mod resolver;
/// Speech service history and audio download
pub mod speech;
/// Object storage upload and presigned URLs
pub mod storage;
/// Enhanced transcript selection
pub mod transcript;
/// Core types
pub mod types;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod test_helpers;

// Re-export commonly used types
pub use config::Config;
pub use error::{ApiError, Error, ErrorDetail, Result, ToHttpStatus};
pub use orchestrator::{Components, Orchestrator};
pub use types::{
    EnhanceRequest, EnhanceResponse, HistorySnapshot, Job, JobId, JobStatus, ResolutionMethod,
    ResolvedArtifact,
};

/// Resolves once the process is asked to stop
///
/// Pass it to [`api::start_api_server`] for graceful shutdown.
///
/// - **Unix:** SIGTERM or SIGINT. If either handler cannot be registered the
///   other is awaited alone, and `ctrl_c` is the last resort.
/// - **Windows/other:** Ctrl+C via `tokio::signal::ctrl_c()`.
pub async fn shutdown_signal() {
    wait_for_signal().await;
    tracing::info!("shutdown requested, draining in-flight requests");
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration can fail in restricted environments (containers, tests)
    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("received SIGTERM"),
                _ = sigint.recv() => tracing::info!("received SIGINT"),
            }
        }
        (Err(e), Ok(mut sigint)) => {
            tracing::warn!(error = %e, "could not register SIGTERM handler, waiting for SIGINT only");
            sigint.recv().await;
            tracing::info!("received SIGINT");
        }
        (Ok(mut sigterm), Err(e)) => {
            tracing::warn!(error = %e, "could not register SIGINT handler, waiting for SIGTERM only");
            sigterm.recv().await;
            tracing::info!("received SIGTERM");
        }
        (Err(e), Err(_)) => {
            tracing::error!(error = %e, "could not register any signal handler, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("received Ctrl+C"),
        Err(e) => tracing::error!(error = %e, "failed to listen for Ctrl+C"),
    }
}
