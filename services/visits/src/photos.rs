//! Visitor photo uploads

use async_trait::async_trait;
use common::{PlatformClient, PlatformResult};
use image::ImageFormat;
use mockall::automock;
use std::path::Path;
use uuid::Uuid;

/// Folder inside the bucket that holds visitor photos
pub const PHOTO_FOLDER: &str = "visitor_photos";

/// A photo picked for upload
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl PhotoUpload {
    /// Read a photo from disk, guessing its content type from the extension
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "photo".to_string());

        Ok(Self {
            content_type: content_type_for(&file_name).to_string(),
            file_name,
            bytes,
        })
    }

    /// Extension of the original file name, lowercased
    pub fn extension(&self) -> String {
        Path::new(&self.file_name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_else(|| "bin".to_string())
    }

    /// Fresh object name, e.g. `visitor_photos/<uuid>.jpg`
    pub fn object_name(&self) -> String {
        format!("{}/{}.{}", PHOTO_FOLDER, Uuid::new_v4(), self.extension())
    }
}

fn content_type_for(file_name: &str) -> &'static str {
    Path::new(file_name)
        .extension()
        .and_then(ImageFormat::from_extension)
        .map(|format| format.to_mime_type())
        .unwrap_or("application/octet-stream")
}

/// Where visitor photos are stored
#[automock]
#[async_trait]
pub trait PhotoStorage: Send + Sync {
    /// Store `photo` under a fresh name and return its public URL
    async fn store(&self, photo: &PhotoUpload, upsert: bool) -> PlatformResult<String>;
}

/// `PhotoStorage` backed by a platform storage bucket
#[derive(Clone, Debug)]
pub struct BucketPhotoStorage {
    client: PlatformClient,
    bucket: String,
}

impl BucketPhotoStorage {
    pub fn new(client: PlatformClient, bucket: &str) -> Self {
        Self {
            client,
            bucket: bucket.to_string(),
        }
    }
}

#[async_trait]
impl PhotoStorage for BucketPhotoStorage {
    async fn store(&self, photo: &PhotoUpload, upsert: bool) -> PlatformResult<String> {
        let path = photo.object_name();
        self.client
            .upload(
                &self.bucket,
                &path,
                photo.bytes.clone(),
                &photo.content_type,
                upsert,
            )
            .await?;
        Ok(self.client.public_url(&self.bucket, &path))
    }
}
