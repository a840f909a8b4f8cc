//! S3-backed seen-store.
//!
//! One object per listing at `{prefix}/seen/{sha256(listing_id)}.json`, body is
//! the [`SeenRecord`]. Pair the bucket with a lifecycle rule expiring
//! `{prefix}/seen/` after the TTL; until then, expired records read as absent.

use anyhow::{Context, Result};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use chrono::Utc;

use super::{storage_key, SeenBackend, SeenRecord};

pub const DEFAULT_BUCKET: &str = "jobs-feed-notifier";
pub const DEFAULT_PREFIX: &str = "jobs-feed-notifier";

pub struct S3Backend {
    client: Client,
    bucket: String,
    prefix: String,
}

impl S3Backend {
    pub fn new(client: Client, bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            prefix: prefix.into(),
        }
    }

    /// Build from the default AWS credential chain.
    pub async fn from_env(bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&config), bucket, prefix)
    }

    fn key_for(&self, listing_id: &str) -> String {
        let prefix = self.prefix.trim_matches('/');
        if prefix.is_empty() {
            format!("seen/{}.json", storage_key(listing_id))
        } else {
            format!("{}/seen/{}.json", prefix, storage_key(listing_id))
        }
    }
}

#[async_trait::async_trait]
impl SeenBackend for S3Backend {
    async fn probe(&self) -> Result<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .with_context(|| format!("head bucket s3://{}", self.bucket))?;
        Ok(())
    }

    async fn get(&self, listing_id: &str) -> Result<Option<SeenRecord>> {
        let key = self.key_for(listing_id);
        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    return Ok(None);
                }
                return Err(service_err)
                    .with_context(|| format!("get s3://{}/{}", self.bucket, key));
            }
        };

        let bytes = output
            .body
            .collect()
            .await
            .with_context(|| format!("read s3://{}/{}", self.bucket, key))?
            .into_bytes();
        let record: SeenRecord = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse s3://{}/{}", self.bucket, key))?;

        if record.is_expired(Utc::now()) {
            return Ok(None);
        }
        Ok(Some(record))
    }

    async fn put(&self, record: &SeenRecord) -> Result<()> {
        let key = self.key_for(&record.listing_id);
        let body = serde_json::to_vec(record).context("serializing seen record")?;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(body))
            .content_type("application/json")
            .send()
            .await
            .with_context(|| format!("put s3://{}/{}", self.bucket, key))?;
        tracing::debug!("recorded s3://{}/{}", self.bucket, key);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "s3"
    }
}
