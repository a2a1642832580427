//! Republishing downloaded audio to object storage

use crate::types::PublishedArtifact;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

mod s3;

pub use s3::S3Publisher;

/// Uploads a local file and hands back a time-limited retrieval URL
#[async_trait]
pub trait ArtifactPublisher: Send + Sync {
    /// Upload `local_path` to `bucket`/`key` and presign a GET valid for `ttl`
    ///
    /// Returns `None` on any storage or local read error; a failed publish
    /// must not discard the already downloaded artifact.
    async fn publish(
        &self,
        local_path: &Path,
        bucket: &str,
        key: &str,
        ttl: Duration,
    ) -> Option<PublishedArtifact>;
}

/// Object key for `file_name`, with the configured prefix prepended verbatim
///
/// The prefix is not treated as a folder: `"audio/"` yields `audio/x.mp3`
/// while `"audio"` yields `audiox.mp3`.
pub fn object_key(prefix: Option<&str>, file_name: &str) -> String {
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}{file_name}"),
        _ => file_name.to_string(),
    }
}
