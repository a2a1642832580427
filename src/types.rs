//! Core types for script-voice-relay

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use utoipa::ToSchema;

/// Opaque identifier of a job on the agent service
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Create a new JobId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Status of a remote job as reported by the agent service
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepted but not started
    Pending,
    /// The agent is working on it
    Running,
    /// Completed normally
    Finished,
    /// Completed with an error
    Failed,
    /// Stopped before completion
    Stopped,
    /// Any status string this crate does not know about
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    /// Whether no further state changes can occur
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Finished | JobStatus::Failed | JobStatus::Stopped
        )
    }

    /// Wire representation of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Finished => "finished",
            JobStatus::Failed => "failed",
            JobStatus::Stopped => "stopped",
            JobStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step the agent took while executing a job
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStep {
    /// Free-form text the agent produced during this step
    #[serde(default, deserialize_with = "null_as_default")]
    pub output: String,
}

/// A file the agent attached to its result
///
/// The agent service reports these either as bare URLs or as objects.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputFile {
    /// A bare URL string
    Url(String),
    /// An object with an optional name and URL
    Described {
        /// File name as reported by the agent
        #[serde(default)]
        name: Option<String>,
        /// Download URL
        #[serde(default)]
        url: Option<String>,
    },
    /// Anything else, kept so one odd entry does not spoil the whole job
    Other(serde_json::Value),
}

impl OutputFile {
    /// The URL of this file, if the agent reported one
    pub fn url(&self) -> Option<&str> {
        match self {
            OutputFile::Url(url) => Some(url),
            OutputFile::Described { url, .. } => url.as_deref(),
            OutputFile::Other(_) => None,
        }
    }
}

/// Snapshot of a remote job, immutable once fetched
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Job id (the detail endpoint may omit it; the client fills it in)
    #[serde(default)]
    pub id: JobId,
    /// Current status
    pub status: JobStatus,
    /// Final free-form output of the agent
    #[serde(default, deserialize_with = "null_as_default")]
    pub output: String,
    /// Steps in execution order
    #[serde(default, deserialize_with = "null_as_default")]
    pub steps: Vec<JobStep>,
    /// Files the agent attached
    #[serde(default, deserialize_with = "null_as_default")]
    pub output_files: Vec<OutputFile>,
}

impl Job {
    /// Candidate texts in scan order: the top-level output, then every step output
    pub fn candidate_texts(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.output.as_str()).chain(self.steps.iter().map(|s| s.output.as_str()))
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Ordered artifact ids (newest first) as listed at one instant
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistorySnapshot {
    ids: Vec<String>,
}

impl HistorySnapshot {
    /// Create a snapshot from ids ordered newest first
    pub fn new(ids: Vec<String>) -> Self {
        Self { ids }
    }

    /// All ids, newest first
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// The most recent id
    pub fn latest(&self) -> Option<&str> {
        self.ids.first().map(String::as_str)
    }

    /// Number of ids listed
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the listing was empty
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Ids present here but absent from `before`
    ///
    /// Keeps this snapshot's newest-first order and yields each id once,
    /// even if the remote listing repeats it.
    pub fn new_since<'a>(&'a self, before: &HistorySnapshot) -> Vec<&'a str> {
        let known: HashSet<&str> = before.ids.iter().map(String::as_str).collect();
        let mut seen = HashSet::new();
        self.ids
            .iter()
            .map(String::as_str)
            .filter(|id| !known.contains(id) && seen.insert(*id))
            .collect()
    }
}

impl<S: Into<String>> FromIterator<S> for HistorySnapshot {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

/// How a resolved artifact was matched to its job
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ResolutionMethod {
    /// A new id appeared between the before and after snapshots
    #[serde(rename = "diff")]
    Diff,
    /// Nothing new appeared; the most recent id was taken instead
    #[serde(rename = "fallback_latest")]
    FallbackLatest,
    /// Nothing could be resolved
    #[serde(rename = "none")]
    Unresolved,
}

impl std::fmt::Display for ResolutionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ResolutionMethod::Diff => "diff",
            ResolutionMethod::FallbackLatest => "fallback_latest",
            ResolutionMethod::Unresolved => "none",
        })
    }
}

/// Result of matching a completed job to the artifact it produced
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedArtifact {
    /// The matched artifact id; `None` exactly when the method is `Unresolved`
    pub artifact_id: Option<String>,
    /// When the resolution was made
    pub resolved_at: DateTime<Utc>,
    /// Provenance of the match
    pub resolution_method: ResolutionMethod,
}

impl ResolvedArtifact {
    /// Resolved from a new id in the after snapshot
    pub fn diff(artifact_id: impl Into<String>) -> Self {
        Self::with(Some(artifact_id.into()), ResolutionMethod::Diff)
    }

    /// Degraded resolution to the most recent listed id
    pub fn fallback_latest(artifact_id: impl Into<String>) -> Self {
        Self::with(Some(artifact_id.into()), ResolutionMethod::FallbackLatest)
    }

    /// Nothing resolved
    pub fn unresolved() -> Self {
        Self::with(None, ResolutionMethod::Unresolved)
    }

    fn with(artifact_id: Option<String>, resolution_method: ResolutionMethod) -> Self {
        Self {
            artifact_id,
            resolved_at: Utc::now(),
            resolution_method,
        }
    }
}

/// Audio written to local storage
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadedArtifact {
    /// Where the bytes were written
    pub local_path: PathBuf,
    /// The artifact the bytes belong to
    pub artifact_id: String,
}

impl DownloadedArtifact {
    /// File name component of the local path
    pub fn file_name(&self) -> Option<&str> {
        self.local_path.file_name().and_then(|n| n.to_str())
    }
}

/// Outcome of an artifact download
///
/// Failure is an expected result, so it is a value and not an error.
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The artifact was written to disk
    Downloaded(DownloadedArtifact),
    /// The artifact could not be fetched
    Failed {
        /// The artifact that was requested
        artifact_id: String,
        /// Why the download failed
        reason: String,
    },
}

impl FetchOutcome {
    /// Whether the download succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Downloaded(_))
    }

    /// The downloaded artifact, if any
    pub fn downloaded(self) -> Option<DownloadedArtifact> {
        match self {
            FetchOutcome::Downloaded(artifact) => Some(artifact),
            FetchOutcome::Failed { .. } => None,
        }
    }
}

/// Artifact republished to object storage
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishedArtifact {
    /// Object key inside the bucket
    pub object_key: String,
    /// Presigned GET URL
    pub presigned_url: String,
    /// When the presigned URL stops working
    pub expires_at: DateTime<Utc>,
}

/// Request body for the enhance endpoint
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct EnhanceRequest {
    /// Script to paste into the text-to-speech application
    pub script: String,
    /// Voice to select before generating (falls back to the configured default)
    #[serde(default)]
    pub voice_id: Option<String>,
}

/// Response body of the enhance endpoint
///
/// Every field except `task_id`, `status` and `message` is optional: a
/// failure after the job completes leaves the affected fields empty.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct EnhanceResponse {
    /// Enhanced transcript picked from the agent output
    pub enhanced_script: Option<String>,
    /// Id of the generated audio element seen on the page
    pub audio_id: Option<String>,
    /// History item resolved as the produced audio
    pub latest_history_item_id: Option<String>,
    /// How `latest_history_item_id` was resolved
    pub resolution_method: Option<ResolutionMethod>,
    /// Local path of the downloaded audio
    #[serde(rename = "elevenlabs_downloaded_audio_path")]
    pub downloaded_audio_path: Option<String>,
    /// Presigned URL of the republished audio
    pub s3_audio_url: Option<String>,
    /// Audio URL the agent itself reported, if any
    pub agent_download_url: Option<String>,
    /// Agent job id
    pub task_id: String,
    /// Final job status
    pub status: String,
    /// Summary of what succeeded
    pub message: String,
}
