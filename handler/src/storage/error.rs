use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    #[error("Invalid {slot} entry {id:?}: {reason}")]
    InvalidEntry {
        slot: &'static str,
        id: Option<String>,
        reason: String,
    },

    #[error("Failed to read notification configuration of {bucket}: {message}")]
    Read { bucket: String, message: String },

    #[error("Failed to write notification configuration of {bucket}: {message}")]
    Write { bucket: String, message: String },
}
