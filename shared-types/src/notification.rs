use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// The three entry lists of a bucket notification configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationSlot {
    Topic,
    Queue,
    LambdaFunction,
}

impl NotificationSlot {
    pub const ALL: [Self; 3] = [Self::Topic, Self::Queue, Self::LambdaFunction];

    /// Field name of the slot in a `NotificationConfiguration` document
    pub fn field_name(self) -> &'static str {
        match self {
            Self::Topic => "TopicConfigurations",
            Self::Queue => "QueueConfigurations",
            Self::LambdaFunction => "LambdaFunctionConfigurations",
        }
    }

    /// Field holding the destination ARN inside an entry of this slot
    pub fn arn_field(self) -> &'static str {
        match self {
            Self::Topic => "TopicArn",
            Self::Queue => "QueueArn",
            Self::LambdaFunction => "LambdaFunctionArn",
        }
    }
}

impl fmt::Display for NotificationSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// A single topic, queue or function notification.
///
/// Only `Id` is interpreted; every other field is kept as an opaque payload
/// and written back exactly as it was read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationEntry {
    #[serde(rename = "Id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl NotificationEntry {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            payload: Map::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }
}

/// Notification configuration attached to a bucket.
///
/// Empty slots are left out when serialized; S3 treats a present but empty
/// list differently from an absent one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NotificationConfiguration {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub topic_configurations: Vec<NotificationEntry>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub queue_configurations: Vec<NotificationEntry>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lambda_function_configurations: Vec<NotificationEntry>,

    /// Carried through untouched; presence enables EventBridge delivery
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_bridge_configuration: Option<Value>,
}

impl NotificationConfiguration {
    pub fn slot(&self, slot: NotificationSlot) -> &[NotificationEntry] {
        match slot {
            NotificationSlot::Topic => &self.topic_configurations,
            NotificationSlot::Queue => &self.queue_configurations,
            NotificationSlot::LambdaFunction => &self.lambda_function_configurations,
        }
    }

    pub fn slot_mut(&mut self, slot: NotificationSlot) -> &mut Vec<NotificationEntry> {
        match slot {
            NotificationSlot::Topic => &mut self.topic_configurations,
            NotificationSlot::Queue => &mut self.queue_configurations,
            NotificationSlot::LambdaFunction => &mut self.lambda_function_configurations,
        }
    }

    /// All entries across the three slots, topic first
    pub fn entries(&self) -> impl Iterator<Item = &NotificationEntry> {
        NotificationSlot::ALL
            .into_iter()
            .flat_map(move |slot| self.slot(slot).iter())
    }

    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none() && self.event_bridge_configuration.is_none()
    }
}
