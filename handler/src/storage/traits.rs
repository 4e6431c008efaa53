use anyhow::Result;
use async_trait::async_trait;
use notification_types::NotificationConfiguration;

/// Access to the notification configuration attached to a bucket
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Read the current configuration.
    ///
    /// A bucket without any configuration yields an empty one; a bucket that
    /// does not exist fails with `StorageError::BucketNotFound`.
    async fn get_notification_configuration(
        &self,
        bucket: &str,
    ) -> Result<NotificationConfiguration>;

    /// Replace the bucket's configuration wholesale.
    ///
    /// Empty slots are never sent to the backing service.
    async fn put_notification_configuration(
        &self,
        bucket: &str,
        config: &NotificationConfiguration,
        skip_destination_validation: bool,
    ) -> Result<()>;
}
