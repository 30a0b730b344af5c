//! Blob storage gateway backed by S3
//!
//! Uploaded assets are identified by their object key (`fileId`) and a
//! public URL derived from the bucket configuration. Deletion verifies
//! nothing; `exists` is available for callers that need to check an object
//! before removing it.

use anyhow::Result;
use aws_sdk_s3::{Client, primitives::ByteStream};
use rand::RngCore;
use tracing::info;

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Bucket all assets live in
    pub bucket: String,
    /// Base URL assets are served from
    pub public_base_url: String,
}

impl StorageConfig {
    /// Create a new StorageConfig from environment variables
    ///
    /// # Environment Variables
    /// - `MEDIA_BUCKET_NAME`: S3 bucket (default: "clipstream-media")
    /// - `MEDIA_PUBLIC_BASE_URL`: public URL prefix (default derived from the bucket)
    pub fn from_env() -> Result<Self> {
        let bucket = std::env::var("MEDIA_BUCKET_NAME")
            .unwrap_or_else(|_| "clipstream-media".to_string());
        let public_base_url = std::env::var("MEDIA_PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("https://{}.s3.amazonaws.com", bucket));

        Ok(StorageConfig {
            bucket,
            public_base_url,
        })
    }
}

/// Descriptor of a stored blob, persisted alongside the owning entity
#[derive(Debug, Clone)]
pub struct StoredFile {
    /// Object key in the bucket
    pub file_id: String,
    /// Public URL of the object
    pub url: String,
}

/// S3-backed blob storage gateway
#[derive(Clone)]
pub struct ObjectStorage {
    client: Client,
    config: StorageConfig,
}

/// Generate a random object file name, keeping the original extension.
pub fn random_object_name(extension: &str) -> String {
    let mut bytes = [0u8; 12];
    rand::thread_rng().fill_bytes(&mut bytes);
    let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    format!("{}{}", hex, extension)
}

fn content_type_for(extension: &str) -> &'static str {
    match extension {
        ".png" => "image/png",
        ".jpg" | ".jpeg" => "image/jpeg",
        ".webp" => "image/webp",
        ".mp4" => "video/mp4",
        ".mov" => "video/quicktime",
        ".avi" => "video/x-msvideo",
        ".webm" => "video/webm",
        ".mkv" => "video/x-matroska",
        _ => "application/octet-stream",
    }
}

impl ObjectStorage {
    /// Create a new storage gateway over an initialized S3 client
    pub fn new(client: Client, config: StorageConfig) -> Self {
        Self { client, config }
    }

    fn url_for(&self, key: &str) -> String {
        format!(
            "{}/{}",
            self.config.public_base_url.trim_end_matches('/'),
            key
        )
    }

    /// Upload a blob under `folder/file_name` and return its descriptor
    pub async fn upload(&self, bytes: Vec<u8>, file_name: &str, folder: &str) -> Result<StoredFile> {
        let key = format!("{}/{}", folder.trim_matches('/'), file_name);
        let extension = crate::validation::file_extension(file_name).unwrap_or_default();

        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(&key)
            .content_type(content_type_for(&extension))
            .body(ByteStream::from(bytes))
            .send()
            .await?;

        info!("Uploaded object {}", key);

        Ok(StoredFile {
            url: self.url_for(&key),
            file_id: key,
        })
    }

    /// Delete a blob by its object key
    pub async fn delete(&self, file_id: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.config.bucket)
            .key(file_id)
            .send()
            .await?;

        info!("Deleted object {}", file_id);
        Ok(())
    }

    /// Check whether an object exists in the bucket
    pub async fn exists(&self, file_id: &str) -> Result<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.config.bucket)
            .key(file_id)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_not_found() {
                    Ok(false)
                } else {
                    Err(anyhow::anyhow!("head_object failed: {}", service_err))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_names_keep_the_extension_and_differ() {
        let a = random_object_name(".mp4");
        let b = random_object_name(".mp4");
        assert!(a.ends_with(".mp4"));
        assert_eq!(a.len(), 24 + 4);
        assert_ne!(a, b);
    }

    #[test]
    fn content_types_cover_the_allow_lists() {
        for ext in crate::validation::IMAGE_FILE_TYPES {
            assert!(content_type_for(ext).starts_with("image/"));
        }
        for ext in crate::validation::VIDEO_FILE_TYPES {
            assert!(content_type_for(ext).starts_with("video/"));
        }
        assert_eq!(content_type_for(".bin"), "application/octet-stream");
    }
}
