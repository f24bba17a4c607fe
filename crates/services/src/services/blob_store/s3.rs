//! S3-compatible blob store.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    Client as S3Client,
    config::Region,
    error::DisplayErrorContext,
    primitives::ByteStream,
    types::{BucketLocationConstraint, CreateBucketConfiguration},
};
use bytes::Bytes;
use tokio::sync::OnceCell;
use url::Url;

use super::{BlobError, BlobStore, DEFAULT_CONTAINER};

const DEFAULT_REGION: &str = "us-east-1";

/// Connection settings parsed from `s3://{bucket}?region=..&endpoint=..&public_url=..`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Config {
    pub bucket: String,
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible services (MinIO, R2, ...).
    pub endpoint: Option<String>,
    /// Base URL objects are publicly served from, e.g. a CDN.
    pub public_url: Option<String>,
}

impl S3Config {
    pub fn parse(raw: &str) -> Result<Self, BlobError> {
        let url = Url::parse(raw).map_err(|e| BlobError::InvalidConfig(e.to_string()))?;
        if url.scheme() != "s3" {
            return Err(BlobError::InvalidConfig(format!(
                "unsupported scheme '{}', expected s3://",
                url.scheme()
            )));
        }

        let bucket = url
            .host_str()
            .filter(|host| !host.is_empty())
            .unwrap_or(DEFAULT_CONTAINER)
            .to_string();

        let mut config = Self {
            bucket,
            region: None,
            endpoint: None,
            public_url: None,
        };

        for (key, value) in url.query_pairs() {
            let value = value.trim().to_string();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "region" => config.region = Some(value),
                "endpoint" => config.endpoint = Some(value.trim_end_matches('/').to_string()),
                "public_url" => config.public_url = Some(value.trim_end_matches('/').to_string()),
                other => {
                    return Err(BlobError::InvalidConfig(format!(
                        "unknown parameter '{other}'"
                    )));
                }
            }
        }

        Ok(config)
    }

    /// Public URL of `key` given the effective region.
    pub fn object_url(&self, region: &str, key: &str) -> String {
        let key = encode_key(key);
        if let Some(base) = &self.public_url {
            format!("{base}/{key}")
        } else if let Some(endpoint) = &self.endpoint {
            format!("{endpoint}/{}/{key}", self.bucket)
        } else {
            format!("https://{}.s3.{region}.amazonaws.com/{key}", self.bucket)
        }
    }
}

/// Percent-encode each path segment of a key, keeping the `/` separators.
fn encode_key(key: &str) -> String {
    key.split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}

pub struct S3BlobStore {
    client: S3Client,
    config: S3Config,
    region: String,
    container_ready: OnceCell<()>,
}

impl S3BlobStore {
    /// Build a client from the default AWS credential chain plus the overrides
    /// carried by `config`.
    pub async fn new(config: S3Config) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let shared = loader.load().await;

        let region = shared
            .region()
            .map(|r| r.to_string())
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: S3Client::from_conf(builder.build()),
            config,
            region,
            container_ready: OnceCell::new(),
        }
    }

    async fn create_bucket_if_missing(&self) -> Result<(), BlobError> {
        let bucket = &self.config.bucket;
        if self.client.head_bucket().bucket(bucket).send().await.is_ok() {
            return Ok(());
        }

        let mut request = self.client.create_bucket().bucket(bucket);
        if self.config.endpoint.is_none() && self.region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }

        request.send().await.map_err(|e| BlobError::Container {
            container: bucket.clone(),
            message: DisplayErrorContext(&e).to_string(),
        })?;

        tracing::info!(bucket = %bucket, "Created blob container");
        Ok(())
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    fn container(&self) -> &str {
        &self.config.bucket
    }

    async fn ensure_container(&self) -> Result<(), BlobError> {
        self.container_ready
            .get_or_try_init(|| self.create_bucket_if_missing())
            .await
            .map(|_| ())
    }

    async fn put(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, BlobError> {
        let size = bytes.len();
        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(key = %key, "S3 put_object failed: {}", DisplayErrorContext(&e));
                BlobError::Upload {
                    key: key.to_string(),
                    message: DisplayErrorContext(&e).to_string(),
                }
            })?;

        tracing::debug!(key = %key, size, "Stored blob");
        Ok(self.config.object_url(&self.region, key))
    }

    async fn delete_if_exists(&self, key: &str) -> Result<bool, BlobError> {
        let bucket = &self.config.bucket;
        match self.client.head_object().bucket(bucket).key(key).send().await {
            Ok(_) => {}
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => {
                return Ok(false);
            }
            Err(e) => {
                return Err(BlobError::Delete {
                    key: key.to_string(),
                    message: DisplayErrorContext(&e).to_string(),
                });
            }
        }

        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| BlobError::Delete {
                key: key.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        tracing::debug!(key = %key, "Deleted blob");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_connection_string() {
        let config = S3Config::parse(
            "s3://board-images?region=eu-west-1&endpoint=http://localhost:9000/&public_url=https://cdn.example.com/",
        )
        .unwrap();

        assert_eq!(config.bucket, "board-images");
        assert_eq!(config.region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.endpoint.as_deref(), Some("http://localhost:9000"));
        assert_eq!(config.public_url.as_deref(), Some("https://cdn.example.com"));
    }

    #[test]
    fn test_parse_defaults_bucket_when_host_is_empty() {
        let config = S3Config::parse("s3://?region=us-west-2").unwrap();
        assert_eq!(config.bucket, DEFAULT_CONTAINER);
        assert_eq!(config.region.as_deref(), Some("us-west-2"));
        assert!(config.endpoint.is_none());
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(
            S3Config::parse("not a url"),
            Err(BlobError::InvalidConfig(_))
        ));
        assert!(matches!(
            S3Config::parse("https://bucket"),
            Err(BlobError::InvalidConfig(_))
        ));
        assert!(matches!(
            S3Config::parse("s3://bucket?colour=blue"),
            Err(BlobError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_object_url_precedence() {
        let mut config = S3Config::parse("s3://imgs").unwrap();
        assert_eq!(
            config.object_url("eu-west-1", "t/1-a.png"),
            "https://imgs.s3.eu-west-1.amazonaws.com/t/1-a.png"
        );

        config.endpoint = Some("http://localhost:9000".to_string());
        assert_eq!(
            config.object_url("eu-west-1", "t/1-a.png"),
            "http://localhost:9000/imgs/t/1-a.png"
        );

        config.public_url = Some("https://cdn.example.com".to_string());
        assert_eq!(
            config.object_url("eu-west-1", "t/1-a.png"),
            "https://cdn.example.com/t/1-a.png"
        );
    }

    #[test]
    fn test_object_url_encodes_segments_not_separators() {
        let config = S3Config::parse("s3://imgs").unwrap();
        assert_eq!(
            config.object_url("us-east-1", "task/abc-my photo#1.png"),
            "https://imgs.s3.us-east-1.amazonaws.com/task/abc-my%20photo%231.png"
        );
    }
}
