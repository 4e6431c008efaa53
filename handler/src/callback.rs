use anyhow::{Context, Result};
use notification_types::{CallbackResponse, CustomResourceEvent, ResponseStatus};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client as ReqwestClient, Request, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{info, instrument};

/// Where and on behalf of which request a result is reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackTarget {
    pub response_url: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    pub physical_resource_id: Option<String>,
}

impl CallbackTarget {
    pub fn from_event(event: &CustomResourceEvent) -> Self {
        Self {
            response_url: event.response_url.clone(),
            stack_id: event.stack_id.clone(),
            request_id: event.request_id.clone(),
            logical_resource_id: event.logical_resource_id.clone(),
            physical_resource_id: event.physical_resource_id.clone(),
        }
    }

    /// Salvage the identifiers of an event that failed validation.
    ///
    /// Returns `None` when there is no `ResponseURL` to report to.
    pub fn recover(raw: &Value) -> Option<Self> {
        let text = |key: &str| raw.get(key).and_then(Value::as_str).map(str::to_string);

        Some(Self {
            response_url: text("ResponseURL").filter(|url| !url.is_empty())?,
            stack_id: text("StackId").unwrap_or_default(),
            request_id: text("RequestId").unwrap_or_default(),
            logical_resource_id: text("LogicalResourceId").unwrap_or_default(),
            physical_resource_id: text("PhysicalResourceId"),
        })
    }

    /// Existing physical id, falling back to the logical id on Create
    pub fn physical_resource_id(&self) -> &str {
        self.physical_resource_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .unwrap_or(&self.logical_resource_id)
    }

    pub fn response(&self, status: ResponseStatus, reason: impl Into<String>) -> CallbackResponse {
        CallbackResponse {
            status,
            reason: reason.into(),
            physical_resource_id: self.physical_resource_id().to_string(),
            stack_id: self.stack_id.clone(),
            request_id: self.request_id.clone(),
            logical_resource_id: self.logical_resource_id.clone(),
            no_echo: false,
            data: None,
        }
    }
}

/// Reports custom resource results to CloudFormation
pub struct CallbackClient {
    client: ReqwestClient,
}

impl CallbackClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = ReqwestClient::builder().timeout(timeout).build()?;

        Ok(Self { client })
    }

    /// Build the PUT for a response.
    ///
    /// The response URL is pre-signed without a content type, so the header
    /// is sent empty.
    pub fn build_request(&self, url: &str, response: &CallbackResponse) -> Result<Request> {
        let body = serde_json::to_vec(response)?;

        let request = self
            .client
            .put(url)
            .header(CONTENT_TYPE, "")
            .body(body)
            .build()
            .with_context(|| format!("Invalid callback URL: {url}"))?;

        Ok(request)
    }

    /// Send a response, failing on transport errors and non-success statuses
    #[instrument(skip(self, url, response), fields(status = %response.status))]
    pub async fn send(&self, url: &str, response: &CallbackResponse) -> Result<StatusCode> {
        let request = self.build_request(url, response)?;

        let reply = self
            .client
            .execute(request)
            .await
            .context("Failed to send callback")?;

        let status = reply.status();
        reply.error_for_status_ref()?;

        info!(http_status = %status, "Callback delivered");
        Ok(status)
    }
}
