use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::notification::NotificationConfiguration;

/// Lifecycle action requested by CloudFormation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestType {
    Create,
    Update,
    Delete,
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
        };
        f.write_str(name)
    }
}

/// Custom resource request delivered by CloudFormation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomResourceEvent {
    pub request_type: RequestType,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,

    #[serde(rename = "ResponseURL")]
    pub response_url: String,

    /// Absent on Create
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,

    pub resource_properties: ResourceProperties,

    /// Present on Update only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_resource_properties: Option<ResourceProperties>,
}

/// Properties of the notifications resource.
///
/// CloudFormation passes scalar properties as strings, so the boolean flags
/// accept `"true"`/`"false"` as well as JSON booleans.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceProperties {
    pub bucket_name: String,

    #[serde(default)]
    pub notification_configuration: NotificationConfiguration,

    /// The resource owns the bucket's entire notification configuration
    #[serde(default, deserialize_with = "flag")]
    pub managed: bool,

    #[serde(default, deserialize_with = "flag")]
    pub skip_destination_validation: bool,
}

fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => Ok(value),
        Flag::Text(text) => match text.to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(de::Error::custom(format!(
                "expected \"true\" or \"false\", found {other:?}"
            ))),
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseStatus {
    Success,
    Failed,
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("SUCCESS"),
            Self::Failed => f.write_str("FAILED"),
        }
    }
}

/// Body PUT to the `ResponseURL`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CallbackResponse {
    pub status: ResponseStatus,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,

    pub physical_resource_id: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,

    #[serde(default)]
    pub no_echo: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
}
