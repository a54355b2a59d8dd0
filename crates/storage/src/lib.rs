//! Durable object storage for generated artifacts.
//!
//! [`S3ObjectStore`] uploads artifact bytes to an S3 bucket under a
//! caller-supplied key, marks them publicly readable, and exposes the
//! stable public URL. Objects are write-once: nothing in this crate
//! overwrites or deletes.

use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;

/// Errors from the object storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The upload did not complete.
    #[error("Upload failed for key '{key}': {detail}")]
    Upload { key: String, detail: String },
}

/// S3-backed artifact store for a single bucket.
///
/// Created once per process and reused across workflow invocations;
/// the inner SDK client is cheaply cloneable.
#[derive(Clone)]
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    /// Base for public URLs, e.g. a CDN domain. Falls back to the
    /// bucket's virtual-hosted S3 URL when not configured.
    public_base_url: Option<String>,
    region: String,
}

impl S3ObjectStore {
    /// Build a store from ambient AWS configuration and environment.
    ///
    /// | Env Var                | Meaning                              |
    /// |------------------------|--------------------------------------|
    /// | `SCENE_BUCKET`         | Target bucket (required)             |
    /// | `SCENE_PUBLIC_URL_BASE`| Optional public base URL (CDN)       |
    pub async fn from_env() -> Self {
        let bucket = std::env::var("SCENE_BUCKET").expect("SCENE_BUCKET must be set");
        let public_base_url = std::env::var("SCENE_PUBLIC_URL_BASE").ok();

        let config = aws_config::load_from_env().await;
        let region = config
            .region()
            .map(|r| r.to_string())
            .unwrap_or_else(|| "us-east-1".to_string());
        let client = aws_sdk_s3::Client::new(&config);

        Self {
            client,
            bucket,
            public_base_url,
            region,
        }
    }

    /// Build a store from an explicit SDK client (used by tests).
    pub fn new(
        client: aws_sdk_s3::Client,
        bucket: String,
        public_base_url: Option<String>,
        region: String,
    ) -> Self {
        Self {
            client,
            bucket,
            public_base_url,
            region,
        }
    }

    /// Upload bytes at `key` with the given content type, publicly
    /// readable, and return the stable public URL.
    pub async fn put_public(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let size = bytes.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .acl(ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(|e| StorageError::Upload {
                key: key.to_string(),
                detail: e.to_string(),
            })?;

        tracing::info!(bucket = %self.bucket, key, size, "Artifact uploaded");
        Ok(self.public_url(key))
    }

    /// Stable public URL for an object at `key`.
    pub fn public_url(&self, key: &str) -> String {
        match &self.public_base_url {
            Some(base) => format!("{}/{key}", base.trim_end_matches('/')),
            None => format!(
                "https://{}.s3.{}.amazonaws.com/{key}",
                self.bucket, self.region
            ),
        }
    }
}
