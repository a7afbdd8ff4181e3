//! S3-compatible object storage backend.
//!
//! Wraps the AWS SDK with path-style addressing so MinIO and other
//! S3-compatible services work out of the box. Locators are fully qualified
//! URLs: `{public_base}/{key}` when a CDN/public base is configured,
//! otherwise the path-style `{endpoint}/{bucket}/{key}`.

use crate::error::StorageError;
use crate::storage::StorageBackend;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    config::{Credentials, Region},
    primitives::ByteStream,
    Client,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Connection settings for an S3-compatible bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Settings {
    pub bucket: String,
    pub endpoint: String,
    pub region: Option<String>,
    pub access_key: String,
    pub secret_key: String,
    /// Optional public URL prefix (CDN or website endpoint). When absent,
    /// locators use path-style `{endpoint}/{bucket}/{key}`.
    pub public_base: Option<String>,
}

/// Object-storage backend for S3 and S3-compatible services.
#[derive(Debug, Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
    locator_base: String,
}

impl S3Storage {
    /// Build a client from connection settings.
    ///
    /// The bucket is probed with a HEAD request; an unreachable bucket is
    /// logged but not fatal, since some deployments deny `HeadBucket` while
    /// allowing writes.
    pub async fn connect(settings: &S3Settings) -> Self {
        let credentials = Credentials::new(
            &settings.access_key,
            &settings.secret_key,
            None,
            None,
            "pagecast",
        );

        let region = settings
            .region
            .clone()
            .unwrap_or_else(|| "us-east-1".to_string());

        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&settings.endpoint)
            .region(Region::new(region))
            .credentials_provider(credentials)
            .force_path_style(true) // Required for MinIO and other S3-compatible services
            .build();

        let client = Client::from_conf(config);

        match client.head_bucket().bucket(&settings.bucket).send().await {
            Ok(_) => debug!("connected to S3 bucket {}", settings.bucket),
            Err(e) => warn!(
                "could not verify bucket {}: {}. Will attempt writes anyway.",
                settings.bucket, e
            ),
        }

        let locator_base = settings
            .public_base
            .as_deref()
            .map(|base| base.trim_end_matches('/').to_string())
            .unwrap_or_else(|| {
                format!(
                    "{}/{}",
                    settings.endpoint.trim_end_matches('/'),
                    settings.bucket
                )
            });

        Self {
            client,
            bucket: settings.bucket.clone(),
            locator_base,
        }
    }
}

#[async_trait]
impl StorageBackend for S3Storage {
    async fn store(
        &self,
        key: &str,
        content: Bytes,
        media_type: &str,
    ) -> Result<String, StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(media_type)
            .body(ByteStream::from(content))
            .send()
            .await
            .map_err(|e| StorageError::Remote {
                key: key.to_string(),
                detail: e.to_string(),
            })?;

        debug!("stored object {}/{}", self.bucket, key);
        Ok(format!("{}/{}", self.locator_base, key))
    }
}
