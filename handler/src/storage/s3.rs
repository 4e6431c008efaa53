use anyhow::Result;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_s3::operation::get_bucket_notification_configuration::GetBucketNotificationConfigurationOutput;
use aws_sdk_s3::types::{
    Event, EventBridgeConfiguration, FilterRule, FilterRuleName, LambdaFunctionConfiguration,
    NotificationConfiguration as S3NotificationConfiguration, NotificationConfigurationFilter,
    QueueConfiguration, S3KeyFilter, TopicConfiguration,
};
use notification_types::{NotificationConfiguration, NotificationEntry, NotificationSlot};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{debug, instrument};

use super::error::StorageError;
use super::traits::NotificationStore;
use crate::config::HandlerConfig;

pub struct S3NotificationStore {
    client: Client,
}

impl S3NotificationStore {
    /// Build a client from the default AWS provider chain plus endpoint overrides
    pub async fn from_config(config: &HandlerConfig) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);

        // Custom endpoint, e.g. LocalStack or MinIO
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        if config.force_path_style {
            builder = builder.force_path_style(true);
        }

        Self {
            client: Client::from_conf(builder.build()),
        }
    }

    /// Wrap a pre-built client (for testing)
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NotificationStore for S3NotificationStore {
    #[instrument(skip(self))]
    async fn get_notification_configuration(
        &self,
        bucket: &str,
    ) -> Result<NotificationConfiguration> {
        let output = match self
            .client
            .get_bucket_notification_configuration()
            .bucket(bucket)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) if err.code() == Some("NoSuchBucket") => {
                return Err(StorageError::BucketNotFound(bucket.to_string()).into());
            }
            Err(err) => {
                return Err(StorageError::Read {
                    bucket: bucket.to_string(),
                    message: DisplayErrorContext(&err).to_string(),
                }
                .into());
            }
        };

        let config = from_sdk_output(&output);
        debug!(entries = config.entries().count(), "Fetched notification configuration");
        Ok(config)
    }

    #[instrument(skip(self, config))]
    async fn put_notification_configuration(
        &self,
        bucket: &str,
        config: &NotificationConfiguration,
        skip_destination_validation: bool,
    ) -> Result<()> {
        let sdk_config = to_sdk_configuration(config)?;

        self.client
            .put_bucket_notification_configuration()
            .bucket(bucket)
            .notification_configuration(sdk_config)
            .skip_destination_validation(skip_destination_validation)
            .send()
            .await
            .map_err(|err| StorageError::Write {
                bucket: bucket.to_string(),
                message: DisplayErrorContext(&err).to_string(),
            })?;

        Ok(())
    }
}

// JSON shape of the fields S3 understands inside an entry. The ARN is looked
// up separately because its name depends on the slot.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EntryFields {
    #[serde(default)]
    events: Vec<String>,
    #[serde(default)]
    filter: Option<FilterFields>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct FilterFields {
    #[serde(default)]
    key: Option<KeyFields>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct KeyFields {
    #[serde(default)]
    filter_rules: Vec<RuleFields>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RuleFields {
    name: Option<String>,
    value: Option<String>,
}

impl FilterFields {
    fn to_sdk(&self) -> NotificationConfigurationFilter {
        let key = self.key.as_ref().map(|key| {
            let rules = key
                .filter_rules
                .iter()
                .map(|rule| {
                    FilterRule::builder()
                        .set_name(rule.name.as_deref().map(FilterRuleName::from))
                        .set_value(rule.value.clone())
                        .build()
                })
                .collect();
            S3KeyFilter::builder().set_filter_rules(Some(rules)).build()
        });

        NotificationConfigurationFilter::builder()
            .set_key(key)
            .build()
    }
}

struct Destination {
    arn: String,
    events: Vec<Event>,
    filter: Option<NotificationConfigurationFilter>,
}

fn invalid_entry(
    slot: NotificationSlot,
    entry: &NotificationEntry,
    reason: impl Into<String>,
) -> StorageError {
    StorageError::InvalidEntry {
        slot: slot.field_name(),
        id: entry.id.clone(),
        reason: reason.into(),
    }
}

fn destination(
    slot: NotificationSlot,
    entry: &NotificationEntry,
) -> Result<Destination, StorageError> {
    let arn = entry
        .field(slot.arn_field())
        .and_then(Value::as_str)
        .ok_or_else(|| invalid_entry(slot, entry, format!("missing {}", slot.arn_field())))?;

    let fields: EntryFields = serde_json::from_value(Value::Object(entry.payload.clone()))
        .map_err(|err| invalid_entry(slot, entry, err.to_string()))?;
    if fields.events.is_empty() {
        return Err(invalid_entry(slot, entry, "no events"));
    }

    Ok(Destination {
        arn: arn.to_string(),
        events: fields.events.iter().map(|e| Event::from(e.as_str())).collect(),
        filter: fields.filter.as_ref().map(FilterFields::to_sdk),
    })
}

fn topic_configuration(entry: &NotificationEntry) -> Result<TopicConfiguration, StorageError> {
    let slot = NotificationSlot::Topic;
    let dest = destination(slot, entry)?;
    TopicConfiguration::builder()
        .set_id(entry.id.clone())
        .topic_arn(dest.arn)
        .set_events(Some(dest.events))
        .set_filter(dest.filter)
        .build()
        .map_err(|err| invalid_entry(slot, entry, err.to_string()))
}

fn queue_configuration(entry: &NotificationEntry) -> Result<QueueConfiguration, StorageError> {
    let slot = NotificationSlot::Queue;
    let dest = destination(slot, entry)?;
    QueueConfiguration::builder()
        .set_id(entry.id.clone())
        .queue_arn(dest.arn)
        .set_events(Some(dest.events))
        .set_filter(dest.filter)
        .build()
        .map_err(|err| invalid_entry(slot, entry, err.to_string()))
}

fn lambda_function_configuration(
    entry: &NotificationEntry,
) -> Result<LambdaFunctionConfiguration, StorageError> {
    let slot = NotificationSlot::LambdaFunction;
    let dest = destination(slot, entry)?;
    LambdaFunctionConfiguration::builder()
        .set_id(entry.id.clone())
        .lambda_function_arn(dest.arn)
        .set_events(Some(dest.events))
        .set_filter(dest.filter)
        .build()
        .map_err(|err| invalid_entry(slot, entry, err.to_string()))
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    (!items.is_empty()).then_some(items)
}

/// Convert to the SDK request shape, leaving empty slots unset
pub(super) fn to_sdk_configuration(
    config: &NotificationConfiguration,
) -> Result<S3NotificationConfiguration, StorageError> {
    let topics = config
        .topic_configurations
        .iter()
        .map(topic_configuration)
        .collect::<Result<Vec<_>, _>>()?;
    let queues = config
        .queue_configurations
        .iter()
        .map(queue_configuration)
        .collect::<Result<Vec<_>, _>>()?;
    let functions = config
        .lambda_function_configurations
        .iter()
        .map(lambda_function_configuration)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(S3NotificationConfiguration::builder()
        .set_topic_configurations(non_empty(topics))
        .set_queue_configurations(non_empty(queues))
        .set_lambda_function_configurations(non_empty(functions))
        .set_event_bridge_configuration(
            config
                .event_bridge_configuration
                .as_ref()
                .map(|_| EventBridgeConfiguration::builder().build()),
        )
        .build())
}

fn filter_to_json(filter: &NotificationConfigurationFilter) -> Value {
    let Some(key) = filter.key() else {
        return json!({});
    };

    let rules: Vec<Value> = key
        .filter_rules()
        .iter()
        .map(|rule| {
            let mut fields = Map::new();
            if let Some(name) = rule.name() {
                fields.insert("Name".to_string(), Value::from(name.as_str()));
            }
            if let Some(value) = rule.value() {
                fields.insert("Value".to_string(), Value::from(value));
            }
            Value::Object(fields)
        })
        .collect();

    json!({ "Key": { "FilterRules": rules } })
}

fn entry_from_sdk(
    slot: NotificationSlot,
    id: Option<&str>,
    arn: &str,
    events: &[Event],
    filter: Option<&NotificationConfigurationFilter>,
) -> NotificationEntry {
    let mut payload = Map::new();
    payload.insert(slot.arn_field().to_string(), Value::from(arn));
    payload.insert(
        "Events".to_string(),
        Value::Array(events.iter().map(|e| Value::from(e.as_str())).collect()),
    );
    if let Some(filter) = filter {
        payload.insert("Filter".to_string(), filter_to_json(filter));
    }

    NotificationEntry {
        id: id.map(str::to_string),
        payload,
    }
}

pub(super) fn from_sdk_output(
    output: &GetBucketNotificationConfigurationOutput,
) -> NotificationConfiguration {
    NotificationConfiguration {
        topic_configurations: output
            .topic_configurations()
            .iter()
            .map(|c| {
                entry_from_sdk(
                    NotificationSlot::Topic,
                    c.id(),
                    c.topic_arn(),
                    c.events(),
                    c.filter(),
                )
            })
            .collect(),
        queue_configurations: output
            .queue_configurations()
            .iter()
            .map(|c| {
                entry_from_sdk(
                    NotificationSlot::Queue,
                    c.id(),
                    c.queue_arn(),
                    c.events(),
                    c.filter(),
                )
            })
            .collect(),
        lambda_function_configurations: output
            .lambda_function_configurations()
            .iter()
            .map(|c| {
                entry_from_sdk(
                    NotificationSlot::LambdaFunction,
                    c.id(),
                    c.lambda_function_arn(),
                    c.events(),
                    c.filter(),
                )
            })
            .collect(),
        event_bridge_configuration: output.event_bridge_configuration().map(|_| json!({})),
    }
}
