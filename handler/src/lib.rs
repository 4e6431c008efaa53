#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod callback;
pub mod config;
pub mod error;
pub mod handler;
pub mod reconcile;
pub mod storage;

pub use callback::{CallbackClient, CallbackTarget};
pub use config::HandlerConfig;
pub use error::HandlerError;
pub use handler::NotificationHandler;
