//! Text-to-speech service collaborators
//!
//! Both seams here are best effort. [`HistoryLister`] returns an empty
//! snapshot instead of failing and [`ArtifactFetcher`] reports failure as a
//! [`FetchOutcome`] value, so neither can abort the pipeline.

use crate::types::{FetchOutcome, HistorySnapshot};
use async_trait::async_trait;

mod audio;
mod history;

pub use audio::AudioFetcher;
pub use history::SpeechHistoryClient;

/// Lists previously generated artifacts, newest first
#[async_trait]
pub trait HistoryLister: Send + Sync {
    /// One listing of the remote catalog; empty on any failure
    async fn list_ids(&self) -> HistorySnapshot;
}

/// Downloads a generated artifact to local storage
#[async_trait]
pub trait ArtifactFetcher: Send + Sync {
    /// Fetch `artifact_id` and write it to a deterministic local path
    async fn download(&self, artifact_id: &str) -> FetchOutcome;
}

pub(crate) fn build_http_client(timeout: std::time::Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("script-voice-relay/", env!("CARGO_PKG_VERSION")))
        .build()
}
