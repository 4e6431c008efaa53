#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

mod event;
mod notification;

pub use event::{
    CallbackResponse, CustomResourceEvent, RequestType, ResourceProperties, ResponseStatus,
};
pub use notification::{NotificationConfiguration, NotificationEntry, NotificationSlot};
