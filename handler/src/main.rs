use lambda_runtime::{Error, LambdaEvent, run, service_fn};
use notifications_handler::storage::S3NotificationStore;
use notifications_handler::{CallbackClient, HandlerConfig, NotificationHandler};
use serde_json::Value;
use std::sync::Arc;
use tracing::{Level, info};

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Lambda adds its own timestamps
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()),
        )
        .with_target(false)
        .without_time()
        .init();

    let config = HandlerConfig::from_env()?;
    info!(?config, "Starting bucket notifications handler");

    let store = S3NotificationStore::from_config(&config).await;
    let callback = CallbackClient::new(config.callback_timeout)?;
    let handler = NotificationHandler::new(Arc::new(store), callback);

    let shared_handler = &handler;
    run(service_fn(move |event: LambdaEvent<Value>| async move {
        let log_stream = event.context.env_config.log_stream.clone();
        shared_handler
            .handle(event.payload, &log_stream)
            .await
            .map_err(Error::from)
    }))
    .await
}
