//! End-to-end enhance-and-voice workflow
//!
//! [`Orchestrator::enhance`] runs one request through every stage:
//!
//! ```text
//! snapshot history ─► submit job ─► wait ─► read output ─► resolve ─► download ─► publish
//! ```
//!
//! Everything up to and including the wait is fatal on failure. Everything
//! after degrades: the response is still returned, with the fields of the
//! failed stage left empty and `message` saying what went wrong.

use crate::agent::instructions::SpeechTask;
use crate::agent::{AgentClient, CompletionWaiter, JobService};
use crate::config::{Config, env};
use crate::error::{Error, Result};
use crate::inspect::{PageInspector, RegexPageInspector};
use crate::resolver::ArtifactResolver;
use crate::speech::{ArtifactFetcher, AudioFetcher, HistoryLister, SpeechHistoryClient};
use crate::storage::{ArtifactPublisher, S3Publisher, object_key};
use crate::transcript;
use crate::types::{
    DownloadedArtifact, EnhanceRequest, EnhanceResponse, Job, JobStatus, PublishedArtifact, ResolvedArtifact,
};
use std::sync::Arc;

/// The collaborators the orchestrator drives
#[derive(Clone)]
pub struct Components {
    /// Agent job submission and lookup
    pub jobs: Arc<dyn JobService>,
    /// Speech history listing
    pub history: Arc<dyn HistoryLister>,
    /// Audio download
    pub fetcher: Arc<dyn ArtifactFetcher>,
    /// Object storage upload
    pub publisher: Arc<dyn ArtifactPublisher>,
    /// Agent output scraping
    pub inspector: Arc<dyn PageInspector>,
}

impl Components {
    /// The HTTP-backed implementations, configured from `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            jobs: Arc::new(AgentClient::new(&config.agent)?),
            history: Arc::new(SpeechHistoryClient::new(&config.speech)?),
            fetcher: Arc::new(AudioFetcher::new(&config.speech)?),
            publisher: Arc::new(S3Publisher::new(&config.storage)),
            inspector: Arc::new(RegexPageInspector::new()),
        })
    }
}

/// Runs enhance requests; shared across requests behind an `Arc`
pub struct Orchestrator {
    config: Arc<Config>,
    jobs: Arc<dyn JobService>,
    waiter: CompletionWaiter,
    resolver: ArtifactResolver,
    fetcher: Arc<dyn ArtifactFetcher>,
    publisher: Arc<dyn ArtifactPublisher>,
    inspector: Arc<dyn PageInspector>,
}

impl Orchestrator {
    /// Validate `config` and build the orchestrator with HTTP-backed components
    ///
    /// # Errors
    /// Returns a configuration error if a required setting is missing.
    pub fn new(config: Config) -> Result<Self> {
        let components = Components::from_config(&config)?;
        Self::with_components(config, components)
    }

    /// Validate `config` and build the orchestrator around the given components
    pub fn with_components(config: Config, components: Components) -> Result<Self> {
        config.validate()?;

        if config.speech.api_key.is_none() {
            tracing::warn!(
                "{} is not set: history resolution and audio download will be skipped",
                env::SPEECH_API_KEY
            );
        }
        if config.storage.bucket.is_none() {
            tracing::warn!("{} is not set: audio will not be uploaded", env::BUCKET);
        }

        Ok(Self {
            waiter: CompletionWaiter::from_config(&config.polling),
            resolver: ArtifactResolver::from_config(components.history, &config.polling),
            jobs: components.jobs,
            fetcher: components.fetcher,
            publisher: components.publisher,
            inspector: components.inspector,
            config: Arc::new(config),
        })
    }

    /// The validated configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Enhance and voice a script
    ///
    /// # Errors
    /// - [`Error::Validation`] for an empty script
    /// - [`Error::Submission`] if the agent refuses the job
    /// - [`Error::Lookup`] or [`Error::Timeout`] if the job cannot be followed to completion
    pub async fn enhance(&self, request: EnhanceRequest) -> Result<EnhanceResponse> {
        if request.script.trim().is_empty() {
            return Err(Error::Validation("script must not be empty".into()));
        }

        let voice_id = request
            .voice_id
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .or(self.config.speech.default_voice_id.as_deref());
        tracing::info!(
            voice_id = voice_id.unwrap_or("<account default>"),
            script_chars = request.script.chars().count(),
            "starting enhance request"
        );

        let instructions = SpeechTask::from_config(&self.config.speech, voice_id, &request.script)
            .ok_or_else(|| {
                Error::config(
                    env::SPEECH_EMAIL,
                    format!("{} and {} must be set in the environment", env::SPEECH_EMAIL, env::SPEECH_PASSWORD),
                )
            })?
            .render();

        let before = self.resolver.snapshot().await;
        let job_id = self.jobs.submit(&instructions).await?;
        let job = self.waiter.wait(self.jobs.as_ref(), &job_id).await?;
        if job.status != JobStatus::Finished {
            tracing::warn!(job_id = %job_id, status = %job.status, "agent task did not finish successfully");
        }

        let candidates: Vec<&str> = job.candidate_texts().collect();
        let enhanced_script = transcript::select(&self.config.transcript.strategies, &candidates, &request.script);
        let audio_id = job
            .steps
            .iter()
            .find_map(|step| self.inspector.find_audio_element_id(&step.output));
        let agent_download_url = self.agent_download_url(&job, &candidates);

        let resolved = self.resolver.resolve(&before).await;
        let downloaded = match &resolved.artifact_id {
            Some(id) => self.fetcher.download(id).await.downloaded(),
            None => None,
        };
        let published = match &downloaded {
            Some(artifact) => self.publish(artifact).await,
            None => None,
        };

        let message = summarize(&job, &resolved, downloaded.as_ref(), published.as_ref(), self.config.storage.bucket.is_some());
        tracing::info!(job_id = %job_id, message = %message, "enhance request complete");

        Ok(EnhanceResponse {
            enhanced_script,
            audio_id,
            latest_history_item_id: resolved.artifact_id.clone(),
            resolution_method: Some(resolved.resolution_method),
            downloaded_audio_path: downloaded.as_ref().map(|a| a.local_path.display().to_string()),
            s3_audio_url: published.map(|p| p.presigned_url),
            agent_download_url,
            task_id: job_id.to_string(),
            status: job.status.to_string(),
            message,
        })
    }

    fn agent_download_url(&self, job: &Job, candidates: &[&str]) -> Option<String> {
        job.output_files
            .iter()
            .filter_map(|file| file.url())
            .find(|url| is_audio_url(url))
            .map(str::to_string)
            .or_else(|| candidates.iter().find_map(|text| self.inspector.find_download_url(text)))
    }

    async fn publish(&self, artifact: &DownloadedArtifact) -> Option<PublishedArtifact> {
        let storage = &self.config.storage;
        let bucket = storage.bucket.as_deref()?;
        let file_name = artifact.file_name()?;
        let key = object_key(storage.key_prefix.as_deref(), file_name);

        self.publisher
            .publish(&artifact.local_path, bucket, &key, storage.url_ttl)
            .await
    }
}

fn is_audio_url(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_ascii_lowercase();
    path.ends_with(".mp3") || path.ends_with(".wav")
}

fn summarize(
    job: &Job,
    resolved: &ResolvedArtifact,
    downloaded: Option<&DownloadedArtifact>,
    published: Option<&PublishedArtifact>,
    bucket_configured: bool,
) -> String {
    let outcome = match (&resolved.artifact_id, downloaded, published) {
        (_, Some(_), Some(_)) => "Audio generated and uploaded to object storage.".to_string(),
        (_, Some(_), None) if !bucket_configured => {
            "Audio generated and downloaded; object storage is not configured, so it was not uploaded.".to_string()
        }
        (_, Some(_), None) => "Audio generated and downloaded, but uploading to object storage failed.".to_string(),
        (Some(id), None, _) => format!("Audio generated, but downloading history item {id} failed."),
        (None, None, _) => "No generated audio could be found in the speech history.".to_string(),
    };

    if job.status == JobStatus::Finished {
        outcome
    } else {
        format!("Agent task ended with status '{}'. {outcome}", job.status)
    }
}
