use s3::creds::Credentials;
use s3::{Bucket, Region};
use uuid::Uuid;

/// Presigned download links must outlive the queue wait plus a portal
/// preview; one day is plenty.
const DOWNLOAD_URL_EXPIRY_SECS: u32 = 86400;

/// Client for the S3-compatible bucket holding uploaded resumes.
pub struct ObjectStore {
    bucket: Box<Bucket>,
}

impl ObjectStore {
    pub fn new(
        bucket_name: &str,
        endpoint: &str,
        access_key: &str,
        secret_key: &str,
    ) -> Result<Self, StorageError> {
        let region = Region::Custom {
            region: "auto".to_string(),
            endpoint: endpoint.to_string(),
        };

        let credentials = Credentials::new(Some(access_key), Some(secret_key), None, None, None)
            .map_err(|e| StorageError::Config(e.to_string()))?;

        let bucket = Bucket::new(bucket_name, region, credentials)
            .map_err(|e| StorageError::Config(e.to_string()))?;

        Ok(Self { bucket })
    }

    /// Store an uploaded resume PDF under a fresh key and return
    /// `(key, fetchable URL)` for the subsequent validation request.
    pub async fn store_resume(
        &self,
        candidate_id: &str,
        data: &[u8],
    ) -> Result<(String, String), StorageError> {
        let key = format!("resumes/{}/{}.pdf", candidate_id, Uuid::new_v4());
        self.bucket
            .put_object_with_content_type(&key, data, "application/pdf")
            .await
            .map_err(StorageError::S3)?;
        let url = self.download_url(&key).await?;
        Ok((key, url))
    }

    /// Presigned GET URL for an immutable stored blob.
    pub async fn download_url(&self, key: &str) -> Result<String, StorageError> {
        self.bucket
            .presign_get(key, DOWNLOAD_URL_EXPIRY_SECS, None)
            .await
            .map_err(StorageError::S3)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("S3 operation failed: {0}")]
    S3(#[from] s3::error::S3Error),

    #[error("Storage configuration error: {0}")]
    Config(String),
}
