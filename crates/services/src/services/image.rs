//! Task image upload, listing and removal.
//!
//! Bytes go to the configured [`BlobBackend`]; metadata rows go to the
//! `task_images` table. Without a backend the service runs in degraded mode
//! and stores rows pointing at placeholder URLs.

use bytes::Bytes;
use db::models::task_image::{CreateTaskImage, TaskImage};
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use super::blob_store::{BlobBackend, BlobError};

/// Largest accepted upload, inclusive.
pub const MAX_IMAGE_SIZE: usize = 5 * 1024 * 1024;

/// Accepted content types, compared lowercase.
pub const ALLOWED_CONTENT_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/gif"];

/// Base of the URLs handed out in degraded mode.
pub const LOCAL_IMAGE_BASE_URL: &str = "https://localhost/images";

#[derive(Debug, Error)]
pub enum ImageError {
    #[error(transparent)]
    Blob(#[from] BlobError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Reasons an upload is refused before reaching storage.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum UploadRejection {
    #[error("No file uploaded")]
    Missing,
    #[error("Invalid file type. Only JPEG, PNG, and GIF are allowed")]
    InvalidType,
    #[error("File size exceeds 5MB limit")]
    TooLarge,
}

/// Check an upload against the emptiness, type and size rules.
pub fn validate_upload(content_type: &str, size: usize) -> Result<(), UploadRejection> {
    if size == 0 {
        return Err(UploadRejection::Missing);
    }
    let content_type = content_type.trim().to_ascii_lowercase();
    if !ALLOWED_CONTENT_TYPES.contains(&content_type.as_str()) {
        return Err(UploadRejection::InvalidType);
    }
    if size > MAX_IMAGE_SIZE {
        return Err(UploadRejection::TooLarge);
    }
    Ok(())
}

/// Unique storage key `{task_id}/{uuid}-{file_name}`.
///
/// Path separators in the client file name are replaced so the key always has
/// exactly two levels.
pub fn storage_key(task_id: Uuid, file_name: &str) -> String {
    let file_name = file_name.replace(['/', '\\'], "_");
    format!("{task_id}/{}-{file_name}", Uuid::new_v4())
}

pub fn local_image_url(key: &str) -> String {
    format!("{LOCAL_IMAGE_BASE_URL}/{key}")
}

#[derive(Clone, Debug)]
pub struct ImageService {
    pool: SqlitePool,
    backend: BlobBackend,
}

impl ImageService {
    pub fn new(pool: SqlitePool, backend: BlobBackend) -> Self {
        Self { pool, backend }
    }

    pub fn backend(&self) -> &BlobBackend {
        &self.backend
    }

    /// Store an image for `task_id` and record it.
    ///
    /// The task must exist; callers check that first.
    pub async fn upload(
        &self,
        task_id: Uuid,
        bytes: Bytes,
        file_name: &str,
        content_type: &str,
    ) -> Result<TaskImage, ImageError> {
        let key = storage_key(task_id, file_name);
        let size = bytes.len();

        let image_url = match &self.backend {
            BlobBackend::None => local_image_url(&key),
            BlobBackend::Configured(store) => {
                store.ensure_container().await?;
                store.put(&key, bytes, content_type).await?
            }
        };

        let data = CreateTaskImage {
            task_id,
            image_url,
            blob_name: key.clone(),
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
        };

        match TaskImage::create(&self.pool, &data, Uuid::new_v4()).await {
            Ok(image) => {
                tracing::info!(
                    task_id = %task_id,
                    image_id = %image.id,
                    size,
                    "Uploaded task image"
                );
                Ok(image)
            }
            Err(e) => {
                // Do not leave an unreferenced object behind
                if let BlobBackend::Configured(store) = &self.backend {
                    if let Err(cleanup) = store.delete_if_exists(&key).await {
                        tracing::warn!(key = %key, "Failed to remove orphaned blob: {}", cleanup);
                    }
                }
                Err(e.into())
            }
        }
    }

    pub async fn list_for_task(&self, task_id: Uuid) -> Result<Vec<TaskImage>, ImageError> {
        Ok(TaskImage::find_by_task_id(&self.pool, task_id).await?)
    }

    /// Delete an image and its blob. Returns `false` if no such image exists.
    ///
    /// An already absent blob is not an error; other backend failures are,
    /// and leave the row in place.
    pub async fn delete(&self, image_id: Uuid) -> Result<bool, ImageError> {
        match TaskImage::find_by_id(&self.pool, image_id).await? {
            Some(image) => self.remove(&image).await,
            None => Ok(false),
        }
    }

    /// Like [`ImageService::delete`], but only when the image belongs to `task_id`.
    pub async fn delete_for_task(&self, task_id: Uuid, image_id: Uuid) -> Result<bool, ImageError> {
        match TaskImage::find_by_id(&self.pool, image_id).await? {
            Some(image) if image.task_id == task_id => self.remove(&image).await,
            _ => Ok(false),
        }
    }

    /// Best-effort removal of every blob belonging to a task, ahead of the
    /// task row being deleted. Failures are logged and skipped.
    /// Returns how many blobs were removed.
    pub async fn purge_task_blobs(&self, task_id: Uuid) -> Result<usize, ImageError> {
        let BlobBackend::Configured(store) = &self.backend else {
            return Ok(0);
        };

        let mut removed = 0;
        for image in TaskImage::find_by_task_id(&self.pool, task_id).await? {
            match store.delete_if_exists(&image.blob_name).await {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(task_id = %task_id, image_id = %image.id, "Failed to delete blob: {}", e);
                }
            }
        }
        Ok(removed)
    }

    async fn remove(&self, image: &TaskImage) -> Result<bool, ImageError> {
        if let BlobBackend::Configured(store) = &self.backend {
            store.delete_if_exists(&image.blob_name).await?;
        }
        let deleted = TaskImage::delete(&self.pool, image.id).await?;
        tracing::info!(task_id = %image.task_id, image_id = %image.id, "Deleted task image");
        Ok(deleted)
    }
}
