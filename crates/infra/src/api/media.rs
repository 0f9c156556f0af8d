//! Media endpoints
//!
//! Upload and download carry binary payloads but still go through the same
//! dispatcher, so an expired credential is refreshed and the transfer retried
//! once just like any JSON call.

use std::path::Path;

use privacyguard_domain::constants::{
    media_download_path, media_path, MEDIA_PATH, MEDIA_UPLOAD_PATH, UPLOAD_FILE_FIELD,
};
use privacyguard_domain::MediaItem;
use tracing::{info, instrument};

use super::auth::expect_body;
use super::client::{ApiClient, ApiRequest, FilePart};
use super::errors::ApiError;

/// A file to upload for processing.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

impl MediaUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { file_name: file_name.into(), bytes, content_type: None }
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Read `path` into memory, guessing the content type from its extension.
    ///
    /// # Errors
    /// Returns `ApiError::Client` if the file cannot be read.
    pub async fn from_path(path: &Path) -> Result<Self, ApiError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| ApiError::Client {
            status: 400,
            message: format!("cannot read {}: {e}", path.display()),
        })?;
        let file_name = path
            .file_name()
            .map_or_else(|| "upload".to_string(), |name| name.to_string_lossy().into_owned());

        let upload = Self::new(file_name, bytes);
        Ok(match guess_content_type(path) {
            Some(mime) => upload.with_content_type(mime),
            None => upload,
        })
    }
}

fn guess_content_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    Some(match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "webm" => "video/webm",
        _ => return None,
    })
}

impl ApiClient {
    /// Submit a file for processing.
    ///
    /// `description` travels as a query parameter, which is where the server
    /// reads it from.
    ///
    /// # Errors
    /// Any dispatcher error.
    #[instrument(skip(self, upload), fields(file = %upload.file_name, bytes = upload.bytes.len()))]
    pub async fn upload_media(
        &self,
        upload: MediaUpload,
        description: Option<&str>,
    ) -> Result<MediaItem, ApiError> {
        let mut request = ApiRequest::post(MEDIA_UPLOAD_PATH).file(FilePart {
            field: UPLOAD_FILE_FIELD.to_string(),
            file_name: upload.file_name,
            bytes: upload.bytes,
            content_type: upload.content_type,
        });
        if let Some(description) = description.filter(|d| !d.is_empty()) {
            request = request.query("description", description);
        }

        let item: MediaItem = expect_body(self.execute(&request).await?, "upload")?;
        info!(media_id = item.id, "Media uploaded");
        Ok(item)
    }

    /// Own media, or everything for admins.
    ///
    /// # Errors
    /// Any dispatcher error.
    pub async fn list_media(&self) -> Result<Vec<MediaItem>, ApiError> {
        Ok(self.get(MEDIA_PATH).await?.unwrap_or_default())
    }

    /// # Errors
    /// `ApiError::NotFound` for an unknown id.
    pub async fn get_media(&self, media_id: i64) -> Result<MediaItem, ApiError> {
        expect_body(self.get(&media_path(media_id)).await?, "media")
    }

    /// Processed bytes of a media item.
    ///
    /// # Errors
    /// Any dispatcher error.
    #[instrument(skip(self))]
    pub async fn download_media(&self, media_id: i64) -> Result<Vec<u8>, ApiError> {
        self.execute_bytes(&ApiRequest::get(media_download_path(media_id))).await
    }

    /// # Errors
    /// Any dispatcher error.
    #[instrument(skip(self))]
    pub async fn delete_media(&self, media_id: i64) -> Result<(), ApiError> {
        self.delete::<serde_json::Value>(&media_path(media_id)).await?;
        info!(media_id, "Media deleted");
        Ok(())
    }
}
