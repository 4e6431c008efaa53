mod error;
mod memory;
mod s3;
mod traits;


pub use error::StorageError;
pub use memory::{InMemoryNotificationStore, RecordedPut};
pub use s3::S3NotificationStore;
pub use traits::NotificationStore;
