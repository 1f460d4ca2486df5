//! MinIO/S3-compatible media storage
//!
//! Objects are written under their storage name with path-style URLs,
//! so `attendance_images/photo.jpg` lives at
//! `{public_endpoint}/{bucket}/attendance_images/photo.jpg`.

use async_trait::async_trait;
use axum::http::{header, HeaderMap, HeaderValue};
use bytes::Bytes;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::{Bucket, BucketConfiguration, Region};
use tracing::{debug, info, warn};

use super::{
    alternative_name, ensure_relative, no_room_error, truncate_name, MediaStorage,
    MAX_NAME_ATTEMPTS,
};
use crate::core::config::MinIOConfig;
use crate::core::error::AppError;

/// Result of a write that must not replace an existing object
#[derive(Debug, PartialEq, Eq)]
enum PutOutcome {
    Written,
    Taken,
}

/// Map the status of an `If-None-Match: *` put. 412 means the key exists;
/// 409 means a concurrent conditional write to the same key won.
fn put_outcome(status: u16) -> Option<PutOutcome> {
    match status {
        200..=299 => Some(PutOutcome::Written),
        409 | 412 => Some(PutOutcome::Taken),
        _ => None,
    }
}

pub struct MinIOMediaStorage {
    bucket: Box<Bucket>,
    region: Region,
    credentials: Credentials,
    public_endpoint: String,
}

impl std::fmt::Debug for MinIOMediaStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MinIOMediaStorage")
            .field("bucket", &self.bucket.name())
            .finish_non_exhaustive()
    }
}

impl MinIOMediaStorage {
    pub fn new(config: &MinIOConfig) -> Result<Self, AppError> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Internal(format!("Failed to create MinIO credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| AppError::Internal(format!("Failed to create MinIO bucket: {}", e)))?;

        // Use path-style URLs for MinIO (http://endpoint/bucket instead of http://bucket.endpoint)
        bucket.set_path_style();

        Ok(Self {
            bucket,
            region,
            credentials,
            public_endpoint: config.public_endpoint.trim_end_matches('/').to_string(),
        })
    }

    pub fn bucket_name(&self) -> String {
        self.bucket.name()
    }

    /// Ensure the bucket exists, create if not
    pub async fn ensure_bucket_exists(&self) -> Result<(), AppError> {
        let result = Bucket::create_with_path_style(
            &self.bucket.name(),
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await;

        match result {
            Ok(_) => {
                info!("Bucket '{}' created successfully", self.bucket.name());
                Ok(())
            }
            Err(e) => {
                let error_str = e.to_string();
                if error_str.contains("BucketAlreadyOwnedByYou")
                    || error_str.contains("BucketAlreadyExists")
                    || error_str.contains("already own it")
                {
                    debug!("Bucket '{}' already exists", self.bucket.name());
                } else {
                    warn!(
                        "Could not create bucket '{}': {}. Assuming it exists.",
                        self.bucket.name(),
                        e
                    );
                }
                Ok(())
            }
        }
    }

    /// Write `name` only if no object has that key yet
    async fn put_if_absent(
        &self,
        name: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<PutOutcome, AppError> {
        let mut headers = HeaderMap::new();
        headers.insert(header::IF_NONE_MATCH, HeaderValue::from_static("*"));

        let status = match self
            .bucket
            .put_object_with_content_type_and_headers(name, data, content_type, Some(headers))
            .await
        {
            Ok(response) => response.status_code(),
            Err(S3Error::HttpFailWithBody(status, _)) => status,
            Err(e) => {
                return Err(AppError::Internal(format!(
                    "Failed to upload file '{}': {}",
                    name, e
                )))
            }
        };

        put_outcome(status).ok_or_else(|| {
            AppError::Internal(format!(
                "Failed to upload file '{}': status {}",
                name, status
            ))
        })
    }
}

#[async_trait]
impl MediaStorage for MinIOMediaStorage {
    async fn save(
        &self,
        name: &str,
        data: Bytes,
        content_type: &str,
        max_length: usize,
    ) -> Result<String, AppError> {
        ensure_relative(name)?;

        let mut candidate =
            truncate_name(name, max_length).ok_or_else(|| no_room_error(name, max_length))?;

        for _ in 0..MAX_NAME_ATTEMPTS {
            match self.put_if_absent(&candidate, &data, content_type).await? {
                PutOutcome::Written => {
                    debug!(
                        "Uploaded '{}' to bucket '{}'",
                        candidate,
                        self.bucket.name()
                    );
                    return Ok(candidate);
                }
                PutOutcome::Taken => {
                    debug!("Object '{}' taken, picking another name", candidate);
                    candidate = alternative_name(name, max_length)
                        .ok_or_else(|| no_room_error(name, max_length))?;
                }
            }
        }

        Err(AppError::Internal(format!(
            "No available name for '{}' after {} attempts",
            name, MAX_NAME_ATTEMPTS
        )))
    }

    async fn delete(&self, name: &str) -> Result<(), AppError> {
        self.bucket
            .delete_object(name)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to delete file '{}': {}", name, e)))?;

        debug!("Deleted '{}' from bucket '{}'", name, self.bucket.name());
        Ok(())
    }

    fn url(&self, name: &str) -> String {
        format!("{}/{}/{}", self.public_endpoint, self.bucket.name(), name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> MinIOConfig {
        MinIOConfig {
            endpoint: "http://minio:9000".to_string(),
            public_endpoint: "https://cdn.example.com/".to_string(),
            access_key: "key".to_string(),
            secret_key: "secret".to_string(),
            bucket: "attendance-media".to_string(),
            region: "us-east-1".to_string(),
        }
    }

    #[test]
    fn test_new_does_not_touch_network() {
        let storage = MinIOMediaStorage::new(&test_config()).unwrap();
        assert_eq!(storage.bucket_name(), "attendance-media");
    }

    #[test]
    fn test_put_outcome_treats_precondition_failure_as_taken() {
        assert_eq!(put_outcome(200), Some(PutOutcome::Written));
        assert_eq!(put_outcome(204), Some(PutOutcome::Written));
        assert_eq!(put_outcome(412), Some(PutOutcome::Taken));
        assert_eq!(put_outcome(409), Some(PutOutcome::Taken));
        assert_eq!(put_outcome(403), None);
        assert_eq!(put_outcome(500), None);
    }

    #[test]
    fn test_url_uses_public_endpoint_and_bucket() {
        let storage = MinIOMediaStorage::new(&test_config()).unwrap();
        assert_eq!(
            storage.url("attendance_images/photo.jpg"),
            "https://cdn.example.com/attendance-media/attendance_images/photo.jpg"
        );
    }
}
