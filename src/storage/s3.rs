use super::ArtifactPublisher;
use crate::config::StorageConfig;
use crate::types::PublishedArtifact;
use async_trait::async_trait;
use axum::http::Method;
use chrono::Utc;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path as ObjectPath;
use object_store::signer::Signer;
use object_store::{ObjectStore, PutPayload};
use std::path::Path;
use std::time::Duration;

/// Publishes to S3 or an S3-compatible store
#[derive(Clone, Debug)]
pub struct S3Publisher {
    config: StorageConfig,
}

impl S3Publisher {
    /// Create a publisher from the storage configuration
    ///
    /// Credentials fall back to the ambient provider chain when no static
    /// keys are configured. The bucket is chosen per call.
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    fn store_for(&self, bucket: &str) -> object_store::Result<AmazonS3> {
        let mut builder = AmazonS3Builder::new()
            .with_region(&self.config.region)
            .with_bucket_name(bucket);

        if let Some(key_id) = &self.config.access_key_id {
            builder = builder.with_access_key_id(key_id);
        }
        if let Some(secret) = &self.config.secret_access_key {
            builder = builder.with_secret_access_key(secret.expose());
        }
        if let Some(endpoint) = &self.config.endpoint {
            builder = builder
                .with_endpoint(endpoint)
                .with_allow_http(endpoint.starts_with("http://"));
        }

        builder.build()
    }

    async fn upload_and_sign(
        &self,
        local_path: &Path,
        bucket: &str,
        key: &str,
        ttl: Duration,
    ) -> Result<PublishedArtifact, String> {
        let bytes = tokio::fs::read(local_path)
            .await
            .map_err(|e| format!("failed to read {}: {e}", local_path.display()))?;
        let size = bytes.len();

        let store = self
            .store_for(bucket)
            .map_err(|e| format!("invalid storage settings: {e}"))?;
        let location = ObjectPath::from(key);

        store
            .put(&location, PutPayload::from(bytes))
            .await
            .map_err(|e| format!("upload failed: {e}"))?;
        tracing::info!(bucket, key = %location, size, "uploaded audio to object storage");

        let url = store
            .signed_url(Method::GET, &location, ttl)
            .await
            .map_err(|e| format!("presigning failed: {e}"))?;

        let expires_at = Utc::now()
            + chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::zero());

        Ok(PublishedArtifact {
            object_key: location.to_string(),
            presigned_url: url.to_string(),
            expires_at,
        })
    }
}

#[async_trait]
impl ArtifactPublisher for S3Publisher {
    async fn publish(
        &self,
        local_path: &Path,
        bucket: &str,
        key: &str,
        ttl: Duration,
    ) -> Option<PublishedArtifact> {
        match self.upload_and_sign(local_path, bucket, key, ttl).await {
            Ok(published) => Some(published),
            Err(reason) => {
                tracing::warn!(bucket, key, reason = %reason, "failed to publish audio");
                None
            }
        }
    }
}
