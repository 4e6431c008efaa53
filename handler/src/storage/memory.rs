use anyhow::Result;
use async_trait::async_trait;
use notification_types::NotificationConfiguration;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::error::StorageError;
use super::traits::NotificationStore;

/// A write seen by [`InMemoryNotificationStore`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedPut {
    pub bucket: String,
    pub skip_destination_validation: bool,
}

/// Bucket notification store kept in process memory.
///
/// Buckets must be registered up front; reads and writes against any other
/// bucket fail the same way S3 does for a missing bucket.
#[derive(Debug, Default)]
pub struct InMemoryNotificationStore {
    buckets: RwLock<HashMap<String, NotificationConfiguration>>,
    puts: RwLock<Vec<RecordedPut>>,
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a bucket with its starting configuration
    pub fn with_bucket(mut self, bucket: impl Into<String>, config: NotificationConfiguration) -> Self {
        self.buckets.get_mut().insert(bucket.into(), config);
        self
    }

    pub async fn configuration(&self, bucket: &str) -> Option<NotificationConfiguration> {
        self.buckets.read().await.get(bucket).cloned()
    }

    pub async fn puts(&self) -> Vec<RecordedPut> {
        self.puts.read().await.clone()
    }
}

#[async_trait]
impl NotificationStore for InMemoryNotificationStore {
    async fn get_notification_configuration(
        &self,
        bucket: &str,
    ) -> Result<NotificationConfiguration> {
        let buckets = self.buckets.read().await;
        let config = buckets
            .get(bucket)
            .cloned()
            .ok_or_else(|| StorageError::BucketNotFound(bucket.to_string()))?;
        Ok(config)
    }

    async fn put_notification_configuration(
        &self,
        bucket: &str,
        config: &NotificationConfiguration,
        skip_destination_validation: bool,
    ) -> Result<()> {
        let mut buckets = self.buckets.write().await;
        let slot = buckets
            .get_mut(bucket)
            .ok_or_else(|| StorageError::BucketNotFound(bucket.to_string()))?;
        *slot = config.clone();

        self.puts.write().await.push(RecordedPut {
            bucket: bucket.to_string(),
            skip_destination_validation,
        });
        Ok(())
    }
}
