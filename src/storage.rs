//! Object storage seam.
//!
//! The runner only ever needs two operations: download an object to a local
//! path, and upload a local file under a key. Each is attempted exactly once;
//! the handler decides which artifact a failure refers to.

use std::path::Path;

use aws_sdk_s3::primitives::ByteStream;

/// Reason string from the underlying store. Context (artifact, key, bucket)
/// is attached by the caller.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct StorageError(String);

impl StorageError {
    pub fn new(reason: impl Into<String>) -> Self {
        StorageError(reason.into())
    }
}

pub trait ObjectStorage {
    fn download(
        &self,
        bucket: &str,
        key: &str,
        dest: &Path,
    ) -> impl std::future::Future<Output = Result<(), StorageError>>;

    fn upload(
        &self,
        src: &Path,
        bucket: &str,
        key: &str,
    ) -> impl std::future::Future<Output = Result<(), StorageError>>;
}

/// S3-backed implementation used by the deployed function.
#[derive(Debug, Clone)]
pub struct S3Storage {
    client: aws_sdk_s3::Client,
}

impl S3Storage {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        S3Storage { client }
    }
}

impl ObjectStorage for S3Storage {
    async fn download(&self, bucket: &str, key: &str, dest: &Path) -> Result<(), StorageError> {
        log::debug!("Downloading s3://{bucket}/{key} to {dest:?}");
        let object = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::new(e.to_string()))?;
        let data = object
            .body
            .collect()
            .await
            .map_err(|e| StorageError::new(e.to_string()))?;
        tokio::fs::write(dest, data.into_bytes())
            .await
            .map_err(|e| StorageError::new(e.to_string()))
    }

    async fn upload(&self, src: &Path, bucket: &str, key: &str) -> Result<(), StorageError> {
        log::debug!("Uploading {src:?} to s3://{bucket}/{key}");
        let body = ByteStream::from_path(src)
            .await
            .map_err(|e| StorageError::new(e.to_string()))?;
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(|e| StorageError::new(e.to_string()))?;
        Ok(())
    }
}
