//! Shared fakes for pipeline tests.

use crate::agent::JobService;
use crate::config::{Config, SecretString};
use crate::error::{Error, Result};
use crate::inspect::RegexPageInspector;
use crate::orchestrator::{Components, Orchestrator};
use crate::speech::{ArtifactFetcher, HistoryLister};
use crate::storage::ArtifactPublisher;
use crate::types::{
    DownloadedArtifact, FetchOutcome, HistorySnapshot, Job, JobId, JobStatus, JobStep, OutputFile,
    PublishedArtifact,
};
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Snapshot from literal ids, newest first
pub(crate) fn snapshot(ids: &[&str]) -> HistorySnapshot {
    ids.iter().copied().collect()
}

/// Valid configuration with a bucket and prefix, default polling and a one minute job deadline
pub(crate) fn test_config() -> Config {
    let mut config = Config::default();
    config.agent.api_key = Some(SecretString::new("bu-test"));
    config.speech.email = Some("voice@example.com".into());
    config.speech.password = Some(SecretString::new("pw"));
    config.speech.api_key = Some(SecretString::new("xi-test"));
    config.storage.bucket = Some("audio-bucket".into());
    config.storage.key_prefix = Some("tts/".into());
    config.polling.job_deadline = Duration::from_secs(60);
    config
}

/// Orchestrator over fakes, with the regex page inspector
pub(crate) fn test_orchestrator(
    config: Config,
    jobs: Arc<ScriptedJobs>,
    history: Arc<ScriptedHistory>,
    fetcher: Arc<FakeFetcher>,
    publisher: Arc<FakePublisher>,
) -> Orchestrator {
    Orchestrator::with_components(
        config,
        Components {
            jobs,
            history,
            fetcher,
            publisher,
            inspector: Arc::new(RegexPageInspector::new()),
        },
    )
    .unwrap()
}

/// Agent service that walks a job through a fixed status sequence
///
/// The last status repeats once the sequence is exhausted.
pub(crate) struct ScriptedJobs {
    statuses: Vec<JobStatus>,
    output: String,
    steps: Vec<JobStep>,
    output_files: Vec<OutputFile>,
    rejection: Option<(u16, String)>,
    fail_after: Option<usize>,
    fetches: AtomicUsize,
    submitted: Mutex<Vec<String>>,
}

impl ScriptedJobs {
    pub(crate) fn new(statuses: impl IntoIterator<Item = JobStatus>) -> Self {
        let statuses: Vec<JobStatus> = statuses.into_iter().collect();
        assert!(!statuses.is_empty(), "at least one status is required");
        Self {
            statuses,
            output: String::new(),
            steps: Vec::new(),
            output_files: Vec::new(),
            rejection: None,
            fail_after: None,
            fetches: AtomicUsize::new(0),
            submitted: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_output(mut self, output: &str) -> Self {
        self.output = output.to_string();
        self
    }

    pub(crate) fn with_steps<'a>(mut self, outputs: impl IntoIterator<Item = &'a str>) -> Self {
        self.steps = outputs
            .into_iter()
            .map(|output| JobStep {
                output: output.to_string(),
            })
            .collect();
        self
    }

    pub(crate) fn with_output_files(mut self, files: Vec<OutputFile>) -> Self {
        self.output_files = files;
        self
    }

    /// Refuse every submission with this status and body
    pub(crate) fn rejecting(mut self, status: u16, body: &str) -> Self {
        self.rejection = Some((status, body.to_string()));
        self
    }

    /// Fail every fetch after the first `n`
    pub(crate) fn failing_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    pub(crate) fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub(crate) fn submitted(&self) -> Vec<String> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobService for ScriptedJobs {
    async fn submit(&self, instructions: &str) -> Result<JobId> {
        if let Some((status, body)) = &self.rejection {
            return Err(Error::Submission {
                status: *status,
                body: body.clone(),
            });
        }
        self.submitted.lock().unwrap().push(instructions.to_string());
        Ok(JobId::new("task-1"))
    }

    async fn fetch(&self, job_id: &JobId) -> Result<Job> {
        let n = self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_after.is_some_and(|limit| n >= limit) {
            return Err(Error::Lookup {
                job_id: job_id.to_string(),
                reason: "scripted failure".into(),
            });
        }
        let status = self.statuses[n.min(self.statuses.len() - 1)];
        Ok(Job {
            id: job_id.clone(),
            status,
            output: self.output.clone(),
            steps: self.steps.clone(),
            output_files: self.output_files.clone(),
        })
    }
}

/// History that returns a fixed sequence of listings, repeating the last
pub(crate) struct ScriptedHistory {
    listings: Vec<HistorySnapshot>,
    calls: AtomicUsize,
}

impl ScriptedHistory {
    pub(crate) fn new(listings: impl IntoIterator<Item = HistorySnapshot>) -> Self {
        let listings: Vec<HistorySnapshot> = listings.into_iter().collect();
        assert!(!listings.is_empty(), "at least one listing is required");
        Self {
            listings,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn list_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HistoryLister for ScriptedHistory {
    async fn list_ids(&self) -> HistorySnapshot {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.listings[n.min(self.listings.len() - 1)].clone()
    }
}

/// Fetcher that pretends to write `uploads/{id}.mp3` without touching disk
pub(crate) struct FakeFetcher {
    fail: bool,
    requested: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub(crate) fn succeeding() -> Self {
        Self {
            fail: false,
            requested: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            requested: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArtifactFetcher for FakeFetcher {
    async fn download(&self, artifact_id: &str) -> FetchOutcome {
        self.requested.lock().unwrap().push(artifact_id.to_string());
        if self.fail {
            return FetchOutcome::Failed {
                artifact_id: artifact_id.to_string(),
                reason: "scripted failure".into(),
            };
        }
        FetchOutcome::Downloaded(DownloadedArtifact {
            local_path: PathBuf::from("uploads").join(format!("{artifact_id}.mp3")),
            artifact_id: artifact_id.to_string(),
        })
    }
}

/// One call to [`FakePublisher::publish`]
#[derive(Clone, Debug)]
pub(crate) struct Upload {
    pub(crate) local_path: PathBuf,
    pub(crate) bucket: String,
    pub(crate) key: String,
    pub(crate) ttl: Duration,
}

/// Publisher that records uploads and signs nothing
pub(crate) struct FakePublisher {
    fail: bool,
    uploads: Mutex<Vec<Upload>>,
}

impl FakePublisher {
    pub(crate) fn succeeding() -> Self {
        Self {
            fail: false,
            uploads: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            uploads: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn uploads(&self) -> Vec<Upload> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArtifactPublisher for FakePublisher {
    async fn publish(
        &self,
        local_path: &Path,
        bucket: &str,
        key: &str,
        ttl: Duration,
    ) -> Option<PublishedArtifact> {
        self.uploads.lock().unwrap().push(Upload {
            local_path: local_path.to_path_buf(),
            bucket: bucket.to_string(),
            key: key.to_string(),
            ttl,
        });
        if self.fail {
            return None;
        }
        Some(PublishedArtifact {
            object_key: key.to_string(),
            presigned_url: format!("https://{bucket}.s3.example.com/{key}?X-Amz-Signature=fake"),
            expires_at: Utc::now() + chrono::Duration::seconds(ttl.as_secs() as i64),
        })
    }
}
