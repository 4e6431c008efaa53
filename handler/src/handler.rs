use anyhow::Result;
use futures::FutureExt;
use notification_types::{CustomResourceEvent, NotificationConfiguration, ResponseStatus};
use serde_json::Value;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{Span, error, info, instrument};

use crate::callback::{CallbackClient, CallbackTarget};
use crate::error::HandlerError;
use crate::reconcile::reconcile;
use crate::storage::NotificationStore;

/// Custom resource handler for bucket notifications.
///
/// Every invocation that names a `ResponseURL` produces exactly one report,
/// whatever happens during reconciliation.
pub struct NotificationHandler {
    store: Arc<dyn NotificationStore>,
    callback: CallbackClient,
}

impl NotificationHandler {
    pub fn new(store: Arc<dyn NotificationStore>, callback: CallbackClient) -> Self {
        Self { store, callback }
    }

    /// Reconcile one raw CloudFormation event and report the outcome.
    ///
    /// Only fails when the event carries no `ResponseURL`, since then there
    /// is nowhere to report to.
    #[instrument(
        skip_all,
        fields(
            request_id = tracing::field::Empty,
            request_type = tracing::field::Empty,
            bucket = tracing::field::Empty
        )
    )]
    pub async fn handle(&self, raw: Value, log_stream: &str) -> Result<ResponseStatus> {
        let (target, outcome) = match serde_json::from_value::<CustomResourceEvent>(raw.clone()) {
            Ok(event) => {
                let span = Span::current();
                span.record("request_id", event.request_id.as_str());
                span.record("request_type", tracing::field::display(event.request_type));
                span.record("bucket", event.resource_properties.bucket_name.as_str());

                let outcome = self.reconcile_guarded(&event).await;
                (CallbackTarget::from_event(&event), outcome.map(|_| ()))
            }
            Err(err) => {
                let Some(target) = CallbackTarget::recover(&raw) else {
                    error!(error = %err, "Malformed event without ResponseURL, nothing to report to");
                    anyhow::bail!("Malformed event without ResponseURL: {err}");
                };
                (target, Err(HandlerError::MalformedEvent(err.to_string())))
            }
        };

        let details = format!("See the details in CloudWatch Log Stream: {log_stream}");
        let (status, reason) = match &outcome {
            Ok(()) => (ResponseStatus::Success, details),
            Err(err) => {
                error!(kind = err.kind(), error = %err, "Failed to put bucket notification configuration");
                (ResponseStatus::Failed, format!("Error: {err}. {details}"))
            }
        };

        let response = target.response(status, reason);
        if let Err(err) = self.callback.send(&target.response_url, &response).await {
            error!(error = %format!("{err:#}"), "Failed to report result to CloudFormation");
        }

        Ok(status)
    }

    /// Run the fetch, merge and apply steps for a validated event
    pub async fn reconcile_event(
        &self,
        event: &CustomResourceEvent,
    ) -> Result<NotificationConfiguration, HandlerError> {
        let props = &event.resource_properties;
        let bucket = props.bucket_name.as_str();
        if bucket.is_empty() {
            return Err(HandlerError::MalformedEvent(
                "ResourceProperties.BucketName is empty".to_string(),
            ));
        }

        let current = self.store.get_notification_configuration(bucket).await?;

        let desired = reconcile(
            current,
            event.request_type,
            props,
            event.old_resource_properties.as_ref(),
        );

        self.store
            .put_notification_configuration(bucket, &desired, props.skip_destination_validation)
            .await?;

        info!(
            topics = desired.topic_configurations.len(),
            queues = desired.queue_configurations.len(),
            functions = desired.lambda_function_configurations.len(),
            "Applied bucket notification configuration"
        );
        Ok(desired)
    }

    async fn reconcile_guarded(
        &self,
        event: &CustomResourceEvent,
    ) -> Result<NotificationConfiguration, HandlerError> {
        match AssertUnwindSafe(self.reconcile_event(event))
            .catch_unwind()
            .await
        {
            Ok(outcome) => outcome,
            Err(panic) => Err(HandlerError::Panicked(panic_message(&*panic))),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
