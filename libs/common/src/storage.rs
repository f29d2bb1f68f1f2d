//! Object storage for uploaded files

use reqwest::Method;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use tracing::info;

use crate::error::PlatformResult;
use crate::platform::PlatformClient;

/// Cache lifetime, in seconds, attached to uploaded objects
pub const UPLOAD_CACHE_SECONDS: u32 = 3600;

impl PlatformClient {
    /// Upload `bytes` to `bucket/path`
    ///
    /// With `upsert` an existing object at the same path is replaced,
    /// otherwise the platform rejects the upload.
    pub async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> PlatformResult<()> {
        let builder = self
            .request(Method::POST, &object_path(bucket, path))
            .header(CONTENT_TYPE, content_type)
            .header(CACHE_CONTROL, format!("max-age={}", UPLOAD_CACHE_SECONDS))
            .header("x-upsert", upsert.to_string())
            .body(bytes);

        self.send(builder).await?;
        info!("Uploaded object {}/{}", bucket, path);
        Ok(())
    }

    /// Publicly readable URL of an object in a public bucket
    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        self.endpoint(&format!(
            "/storage/v1/object/public/{}/{}",
            bucket,
            path.trim_start_matches('/')
        ))
    }
}

fn object_path(bucket: &str, path: &str) -> String {
    format!("/storage/v1/object/{}/{}", bucket, path.trim_start_matches('/'))
}
