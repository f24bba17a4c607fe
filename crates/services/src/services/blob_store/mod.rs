//! Object storage for task images.
//!
//! The backend is an explicit variant: [`BlobBackend::None`] runs the image
//! service in degraded mode (placeholder URLs, nothing stored), while
//! [`BlobBackend::Configured`] writes through a [`BlobStore`] implementation.

#[cfg(any(test, feature = "test-utils"))]
mod memory;
mod s3;

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[cfg(any(test, feature = "test-utils"))]
pub use memory::{InMemoryBlobStore, StoredBlob};
pub use s3::{S3BlobStore, S3Config};

/// Container (bucket) used when the connection string does not name one.
pub const DEFAULT_CONTAINER: &str = "task-images";

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("invalid blob storage URL: {0}")]
    InvalidConfig(String),
    #[error("failed to prepare container {container}: {message}")]
    Container { container: String, message: String },
    #[error("failed to upload {key}: {message}")]
    Upload { key: String, message: String },
    #[error("failed to delete {key}: {message}")]
    Delete { key: String, message: String },
}

/// A container of publicly readable objects addressed by key.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Name of the container objects are written to.
    fn container(&self) -> &str;

    /// Create the container if it does not exist yet.
    async fn ensure_container(&self) -> Result<(), BlobError>;

    /// Store `bytes` under `key` and return the public URL of the object.
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str)
    -> Result<String, BlobError>;

    /// Remove the object under `key`. Returns `false` when it was already absent.
    async fn delete_if_exists(&self, key: &str) -> Result<bool, BlobError>;
}

#[derive(Clone, Default)]
pub enum BlobBackend {
    /// No object storage configured: uploads get placeholder URLs.
    #[default]
    None,
    Configured(Arc<dyn BlobStore>),
}

impl BlobBackend {
    pub fn configured(store: impl BlobStore + 'static) -> Self {
        Self::Configured(Arc::new(store))
    }

    /// Build the backend from an optional connection string.
    ///
    /// A missing or blank string selects degraded mode; a malformed one is an error.
    pub async fn from_connection_string(raw: Option<&str>) -> Result<Self, BlobError> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            None => {
                tracing::warn!("No blob storage configured, image URLs will be local placeholders");
                Ok(Self::None)
            }
            Some(raw) => {
                let config = S3Config::parse(raw)?;
                tracing::info!(bucket = %config.bucket, "Using S3 blob storage");
                Ok(Self::configured(S3BlobStore::new(config).await))
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, Self::Configured(_))
    }

    /// Short label for health reporting.
    pub fn label(&self) -> &'static str {
        match self {
            Self::None => "local",
            Self::Configured(_) => "configured",
        }
    }
}

impl fmt::Debug for BlobBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("BlobBackend::None"),
            Self::Configured(store) => f
                .debug_tuple("BlobBackend::Configured")
                .field(&store.container())
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_or_blank_connection_string_is_degraded() {
        let backend = BlobBackend::from_connection_string(None).await.unwrap();
        assert!(!backend.is_configured());
        assert_eq!(backend.label(), "local");

        let backend = BlobBackend::from_connection_string(Some("   "))
            .await
            .unwrap();
        assert!(!backend.is_configured());
    }

    #[tokio::test]
    async fn test_malformed_connection_string_is_an_error() {
        let result = BlobBackend::from_connection_string(Some("ftp://bucket")).await;
        assert!(matches!(result, Err(BlobError::InvalidConfig(_))));
    }

    #[test]
    fn test_configured_label() {
        let backend = BlobBackend::configured(InMemoryBlobStore::new());
        assert!(backend.is_configured());
        assert_eq!(backend.label(), "configured");
        assert_eq!(
            format!("{backend:?}"),
            format!("BlobBackend::Configured(\"{DEFAULT_CONTAINER}\")")
        );
    }
}
