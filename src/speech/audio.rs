use super::{ArtifactFetcher, build_http_client};
use crate::config::{SecretString, SpeechConfig};
use crate::error::Result;
use crate::types::{DownloadedArtifact, FetchOutcome};
use async_trait::async_trait;
use std::path::PathBuf;

/// Downloads generated audio from the speech service's history
#[derive(Clone)]
pub struct AudioFetcher {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
    download_dir: PathBuf,
    extension: String,
}

impl AudioFetcher {
    /// Create a fetcher from the speech configuration
    pub fn new(config: &SpeechConfig) -> Result<Self> {
        Ok(Self {
            http: build_http_client(config.request_timeout)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            download_dir: config.download_dir.clone(),
            extension: config.audio_extension.clone(),
        })
    }

    /// Local path an artifact is written to: `{download_dir}/{artifact_id}.{ext}`
    pub fn local_path(&self, artifact_id: &str) -> PathBuf {
        self.download_dir
            .join(format!("{artifact_id}.{}", self.extension))
    }

    async fn fetch_to_disk(&self, api_key: &SecretString, artifact_id: &str) -> std::result::Result<PathBuf, String> {
        let response = self
            .http
            .get(format!(
                "{}/v1/history/{}/audio",
                self.base_url,
                urlencoding::encode(artifact_id)
            ))
            .header("xi-api-key", api_key.expose())
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("speech service returned {status}"));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| format!("failed to read audio body: {e}"))?;

        tokio::fs::create_dir_all(&self.download_dir)
            .await
            .map_err(|e| format!("failed to create {}: {e}", self.download_dir.display()))?;

        let path = self.local_path(artifact_id);
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| format!("failed to write {}: {e}", path.display()))?;

        Ok(path)
    }
}

/// Ids end up as file names, so they must be one plain path component
fn is_safe_file_stem(artifact_id: &str) -> bool {
    !artifact_id.is_empty()
        && artifact_id != "."
        && artifact_id != ".."
        && !artifact_id.contains(['/', '\\'])
}

#[async_trait]
impl ArtifactFetcher for AudioFetcher {
    async fn download(&self, artifact_id: &str) -> FetchOutcome {
        let failed = |reason: String| {
            tracing::warn!(artifact_id, reason = %reason, "audio download failed");
            FetchOutcome::Failed {
                artifact_id: artifact_id.to_string(),
                reason,
            }
        };

        if !is_safe_file_stem(artifact_id) {
            return failed("artifact id is not a valid file name".into());
        }
        let Some(api_key) = &self.api_key else {
            return failed("speech API key is not configured".into());
        };

        match self.fetch_to_disk(api_key, artifact_id).await {
            Ok(local_path) => {
                tracing::info!(artifact_id, path = %local_path.display(), "downloaded audio");
                FetchOutcome::Downloaded(DownloadedArtifact {
                    local_path,
                    artifact_id: artifact_id.to_string(),
                })
            }
            Err(reason) => failed(reason),
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const AUDIO: &[u8] = b"ID3\x04\x00fake-mpeg-frames";

    fn fetcher_for(server: &MockServer, dir: &TempDir, api_key: Option<&str>) -> AudioFetcher {
        AudioFetcher::new(&SpeechConfig {
            base_url: server.uri(),
            api_key: api_key.map(SecretString::new),
            download_dir: dir.path().join("uploads"),
            ..SpeechConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn writes_audio_to_deterministic_path() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        Mock::given(method("GET"))
            .and(path("/v1/history/hist-1/audio"))
            .and(header("xi-api-key", "xi-test"))
            .and(header("accept", "audio/mpeg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(AUDIO))
            .mount(&server)
            .await;

        let outcome = fetcher_for(&server, &dir, Some("xi-test")).download("hist-1").await;

        let artifact = outcome.downloaded().unwrap();
        assert_eq!(artifact.artifact_id, "hist-1");
        assert_eq!(artifact.local_path, dir.path().join("uploads").join("hist-1.mp3"));
        assert_eq!(artifact.file_name(), Some("hist-1.mp3"));
        assert_eq!(std::fs::read(&artifact.local_path).unwrap(), AUDIO);
    }

    #[tokio::test]
    async fn http_failure_is_a_failed_outcome() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        Mock::given(method("GET"))
            .and(path("/v1/history/gone/audio"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let outcome = fetcher_for(&server, &dir, Some("xi-test")).download("gone").await;

        match outcome {
            FetchOutcome::Failed { artifact_id, reason } => {
                assert_eq!(artifact_id, "gone");
                assert!(reason.contains("404"), "reason: {reason}");
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(!dir.path().join("uploads").join("gone.mp3").exists());
    }

    #[tokio::test]
    async fn missing_api_key_is_a_failed_outcome() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();

        let outcome = fetcher_for(&server, &dir, None).download("hist-1").await;
        assert!(!outcome.is_success());
    }

    #[tokio::test]
    async fn path_like_ids_are_rejected_before_any_request() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(AUDIO))
            .expect(0)
            .mount(&server)
            .await;
        let fetcher = fetcher_for(&server, &dir, Some("xi-test"));

        for id in ["", ".", "..", "../escape", "a/b", "a\\b"] {
            assert!(!fetcher.download(id).await.is_success(), "id {id:?} accepted");
        }
    }

    #[test]
    fn local_path_uses_configured_extension() {
        let config = SpeechConfig {
            download_dir: PathBuf::from("/data/audio"),
            audio_extension: "wav".into(),
            ..SpeechConfig::default()
        };
        let fetcher = AudioFetcher::new(&config).unwrap();
        assert_eq!(fetcher.local_path("x1"), PathBuf::from("/data/audio/x1.wav"));
    }
}
