#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

use aws_sdk_s3::Client;
use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use mockito::{Matcher, Server, ServerGuard};
use notification_types::{NotificationConfiguration, NotificationEntry};
use notifications_handler::storage::{NotificationStore, S3NotificationStore, StorageError};
use serde_json::json;

const BUCKET: &str = "fake_bucket";

const EXISTING_CONFIGURATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<NotificationConfiguration xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <QueueConfiguration>
    <Id>created-by-cdk</Id>
    <Queue>arn:aws:sqs:us-east-1:444455556666:old-queue</Queue>
    <Event>s3:ObjectCreated:Post</Event>
    <Filter>
      <S3Key>
        <FilterRule>
          <Name>suffix</Name>
          <Value>string</Value>
        </FilterRule>
      </S3Key>
    </Filter>
  </QueueConfiguration>
</NotificationConfiguration>"#;

const NO_SUCH_BUCKET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Error>
  <Code>NoSuchBucket</Code>
  <Message>The specified bucket does not exist</Message>
  <BucketName>fake_bucket</BucketName>
</Error>"#;

const ACCESS_DENIED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Error>
  <Code>AccessDenied</Code>
  <Message>Access Denied</Message>
</Error>"#;

fn s3_store(server: &ServerGuard) -> S3NotificationStore {
    let config = aws_sdk_s3::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(Credentials::new("test", "test", None, None, "static"))
        .endpoint_url(server.url())
        .force_path_style(true)
        .retry_config(RetryConfig::disabled())
        .build();

    S3NotificationStore::from_client(Client::from_conf(config))
}

fn new_queue_configuration() -> NotificationConfiguration {
    NotificationConfiguration {
        queue_configurations: vec![
            NotificationEntry::new("my-function-hash")
                .with_field("QueueArn", "arn:aws:sqs:us-east-1:444455556666:new-queue")
                .with_field("Events", json!(["s3:ObjectCreated:*"])),
        ],
        ..Default::default()
    }
}

#[tokio::test]
async fn test_get_existing_configuration() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/fake_bucket")
        .match_query(Matcher::Regex("notification".to_string()))
        .with_status(200)
        .with_header("content-type", "application/xml")
        .with_body(EXISTING_CONFIGURATION)
        .create_async()
        .await;

    let config = s3_store(&server)
        .get_notification_configuration(BUCKET)
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(config.topic_configurations.is_empty());
    assert!(config.lambda_function_configurations.is_empty());
    assert_eq!(config.queue_configurations.len(), 1);

    let entry = &config.queue_configurations[0];
    assert_eq!(entry.id.as_deref(), Some("created-by-cdk"));
    assert_eq!(
        entry.field("QueueArn"),
        Some(&json!("arn:aws:sqs:us-east-1:444455556666:old-queue"))
    );
    assert_eq!(entry.field("Events"), Some(&json!(["s3:ObjectCreated:Post"])));
    assert_eq!(
        entry.field("Filter"),
        Some(&json!({"Key": {"FilterRules": [{"Name": "suffix", "Value": "string"}]}}))
    );
}

#[tokio::test]
async fn test_get_missing_bucket() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/fake_bucket")
        .match_query(Matcher::Any)
        .with_status(404)
        .with_header("content-type", "application/xml")
        .with_body(NO_SUCH_BUCKET)
        .create_async()
        .await;

    let err = s3_store(&server)
        .get_notification_configuration(BUCKET)
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<StorageError>(),
        Some(StorageError::BucketNotFound(name)) if name == BUCKET
    ));
}

#[tokio::test]
async fn test_get_other_failure_is_read_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/fake_bucket")
        .match_query(Matcher::Any)
        .with_status(403)
        .with_header("content-type", "application/xml")
        .with_body(ACCESS_DENIED)
        .create_async()
        .await;

    let err = s3_store(&server)
        .get_notification_configuration(BUCKET)
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<StorageError>(),
        Some(StorageError::Read { .. })
    ));
}

#[tokio::test]
async fn test_put_configuration() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PUT", "/fake_bucket")
        .match_query(Matcher::Regex("notification".to_string()))
        .match_header("x-amz-skip-destination-validation", "true")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex("<QueueConfiguration>".to_string()),
            Matcher::Regex("<Id>my-function-hash</Id>".to_string()),
            Matcher::Regex("new-queue</Queue>".to_string()),
        ]))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    s3_store(&server)
        .put_notification_configuration(BUCKET, &new_queue_configuration(), true)
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_put_rejected() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("PUT", "/fake_bucket")
        .match_query(Matcher::Any)
        .with_status(403)
        .with_header("content-type", "application/xml")
        .with_body(ACCESS_DENIED)
        .create_async()
        .await;

    let err = s3_store(&server)
        .put_notification_configuration(BUCKET, &new_queue_configuration(), false)
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<StorageError>(),
        Some(StorageError::Write { bucket, .. }) if bucket == BUCKET
    ));
}

#[tokio::test]
async fn test_put_invalid_entry_is_not_sent() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PUT", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let config = NotificationConfiguration {
        queue_configurations: vec![NotificationEntry::new("no-arn")],
        ..Default::default()
    };

    let err = s3_store(&server)
        .put_notification_configuration(BUCKET, &config, false)
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<StorageError>(),
        Some(StorageError::InvalidEntry { .. })
    ));
    mock.assert_async().await;
}
