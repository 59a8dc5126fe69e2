//! Object store abstraction
//!
//! Blob CRUD against an S3-compatible store (MinIO in the default
//! deployment). Rows in the metadata store reference blobs by a stable
//! `"bucket/key"` string; [`parse_ref`] splits it back apart.

use crate::config::ObjectStoreConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::create_bucket::CreateBucketError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use aws_sdk_s3::Client as S3Client;
use tracing::debug;

/// Split a `"bucket/key"` reference into its parts.
///
/// Keys may contain further slashes; only the first separator splits.
pub fn parse_ref(storage_url: &str) -> Result<(&str, &str)> {
    match storage_url.split_once('/') {
        Some((bucket, key)) if !bucket.is_empty() && !key.is_empty() => Ok((bucket, key)),
        _ => Err(AppError::invalid(format!(
            "malformed storage reference: {:?}",
            storage_url
        ))),
    }
}

/// Format a `"bucket/key"` reference.
pub fn format_ref(bucket: &str, key: &str) -> String {
    format!("{}/{}", bucket, key)
}

/// Trait for blob storage
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Create the bucket if it does not exist; existing buckets are fine
    async fn ensure_bucket(&self, bucket: &str) -> Result<()>;

    /// Store bytes under a key, overwriting on conflict
    async fn put(&self, bucket: &str, key: &str, data: Vec<u8>) -> Result<()>;

    /// Fetch bytes; a missing key is a NotFound error
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;

    /// Delete one object
    async fn delete(&self, bucket: &str, key: &str) -> Result<()>;

    /// Delete several objects from one bucket
    async fn delete_many(&self, bucket: &str, keys: &[String]) -> Result<()>;
}

/// S3 / MinIO implementation
pub struct S3ObjectStore {
    client: S3Client,
}

impl S3ObjectStore {
    /// Build a client against the configured endpoint (path-style, as MinIO
    /// requires).
    pub fn new(config: &ObjectStoreConfig) -> Self {
        let credentials = Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            "corpora-static",
        );

        let region = config
            .region
            .clone()
            .unwrap_or_else(|| "us-east-1".to_string());

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
            .endpoint_url(&config.endpoint)
            .region(Region::new(region))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Self {
            client: S3Client::from_conf(s3_config),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn ensure_bucket(&self, bucket: &str) -> Result<()> {
        match self.client.create_bucket().bucket(bucket).send().await {
            Ok(_) => {
                debug!(bucket, "Bucket created");
                Ok(())
            }
            Err(SdkError::ServiceError(err)) => match err.err() {
                CreateBucketError::BucketAlreadyOwnedByYou(_)
                | CreateBucketError::BucketAlreadyExists(_) => Ok(()),
                other => Err(AppError::ObjectStore {
                    message: format!("failed to create bucket {}: {}", bucket, other),
                }),
            },
            Err(e) => Err(AppError::ObjectStore {
                message: format!("failed to create bucket {}: {}", bucket, e),
            }),
        }
    }

    async fn put(&self, bucket: &str, key: &str, data: Vec<u8>) -> Result<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| AppError::ObjectStore {
                message: format!("failed to put {}/{}: {}", bucket, key, e),
            })?;

        debug!(bucket, key, "Object stored");
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| match &e {
                SdkError::ServiceError(err) if err.err().is_no_such_key() => {
                    AppError::not_found("object", format_ref(bucket, key))
                }
                _ => AppError::ObjectStore {
                    message: format!("failed to get {}/{}: {}", bucket, key, e),
                },
            })?;

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| AppError::ObjectStore {
                message: format!("failed to read {}/{}: {}", bucket, key, e),
            })?;

        Ok(data.into_bytes().to_vec())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::ObjectStore {
                message: format!("failed to delete {}/{}: {}", bucket, key, e),
            })?;

        debug!(bucket, key, "Object deleted");
        Ok(())
    }

    async fn delete_many(&self, bucket: &str, keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }

        let mut objects = Vec::with_capacity(keys.len());
        for key in keys {
            objects.push(
                ObjectIdentifier::builder()
                    .key(key)
                    .build()
                    .map_err(|e| AppError::ObjectStore {
                        message: format!("invalid key {:?}: {}", key, e),
                    })?,
            );
        }

        let delete = Delete::builder()
            .set_objects(Some(objects))
            .build()
            .map_err(|e| AppError::ObjectStore {
                message: format!("failed to build delete request: {}", e),
            })?;

        self.client
            .delete_objects()
            .bucket(bucket)
            .delete(delete)
            .send()
            .await
            .map_err(|e| AppError::ObjectStore {
                message: format!("failed to delete {} objects from {}: {}", keys.len(), bucket, e),
            })?;

        debug!(bucket, count = keys.len(), "Objects deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ref() {
        assert_eq!(parse_ref("chunks/report_chunk_1.txt").unwrap(), ("chunks", "report_chunk_1.txt"));
        // Keys keep their inner slashes
        assert_eq!(parse_ref("pdfs/2024/q1.pdf").unwrap(), ("pdfs", "2024/q1.pdf"));

        assert!(parse_ref("no-separator").is_err());
        assert!(parse_ref("/leading").is_err());
        assert!(parse_ref("trailing/").is_err());
    }

    #[test]
    fn test_format_ref_round_trip() {
        let url = format_ref("chunks", "doc_chunk_2.txt");
        assert_eq!(parse_ref(&url).unwrap(), ("chunks", "doc_chunk_2.txt"));
    }
}
