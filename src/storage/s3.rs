//! AWS S3 state store.
//!
//! Stores the state document as a single object at
//! `{bucket}/{prefix}/{key}`. `put_object` replaces the object atomically,
//! so readers see either the previous or the new document.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;

use crate::error::{AppError, Result};
use crate::models::HashCodeSet;
use crate::storage::{StateDocument, StateGateway};

/// S3-based state storage.
#[derive(Clone)]
pub struct S3StateStore {
    client: Client,
    bucket: String,
    prefix: String,
    key: String,
}

impl S3StateStore {
    /// Create a new S3 state store.
    pub fn new(
        client: Client,
        bucket: impl Into<String>,
        prefix: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            prefix: prefix.into(),
            key: key.into(),
        }
    }

    /// Create S3 state storage from environment configuration.
    pub async fn from_env(key: impl Into<String>) -> Result<Self> {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let client = Client::new(&config);

        let bucket =
            std::env::var("S3_BUCKET").unwrap_or_else(|_| "contract-notifications".to_string());
        let prefix = std::env::var("S3_PREFIX").unwrap_or_else(|_| "notifier".to_string());

        Ok(Self::new(client, bucket, prefix, key))
    }

    /// Point the store at a different state document key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Full object key of the state document.
    fn object_key(&self) -> String {
        join_key(&self.prefix, &self.key)
    }

    /// Read an object, returning None if it doesn't exist.
    pub async fn read_bytes_optional(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match result {
            Ok(output) => {
                let bytes = output
                    .body
                    .collect()
                    .await
                    .map_err(|e| AppError::S3(e.to_string()))?;
                Ok(Some(bytes.into_bytes().to_vec()))
            }
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    log::info!("No existing object at s3://{}/{}", self.bucket, key);
                    Ok(None)
                } else {
                    Err(AppError::S3(service_err.to_string()))
                }
            }
        }
    }

    /// Write an object, replacing any existing one.
    async fn write_bytes(&self, key: &str, bytes: Vec<u8>) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type("application/json")
            .send()
            .await
            .map_err(|e| AppError::S3(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl StateGateway for S3StateStore {
    async fn read_identifiers(&self) -> Result<HashCodeSet> {
        let key = self.object_key();
        let bytes = self
            .read_bytes_optional(&key)
            .await
            .map_err(AppError::state)?;

        match bytes {
            Some(bytes) => {
                let document: StateDocument = serde_json::from_slice(&bytes).map_err(|e| {
                    AppError::state(format!("s3://{}/{} is not a state document: {}", self.bucket, key, e))
                })?;
                Ok(document.into_set())
            }
            None => Ok(HashCodeSet::new()),
        }
    }

    async fn write_identifiers(&self, hash_codes: &HashCodeSet) -> Result<()> {
        let key = self.object_key();
        let json = serde_json::to_vec_pretty(&StateDocument::new(hash_codes))?;

        self.write_bytes(&key, json)
            .await
            .map_err(AppError::persist)?;

        log::info!(
            "Stored {} hash codes to s3://{}/{}",
            hash_codes.len(),
            self.bucket,
            key
        );
        Ok(())
    }
}

/// Join an optional prefix and a key with a single slash.
pub(crate) fn join_key(prefix: &str, key: &str) -> String {
    let prefix = prefix.trim_matches('/');
    let key = key.trim_start_matches('/');
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}/{}", prefix, key)
    }
}
