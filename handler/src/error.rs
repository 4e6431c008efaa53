use thiserror::Error;

use crate::storage::StorageError;

/// Everything that turns an invocation into a FAILED report
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Other(String),

    #[error("Reconciliation panicked: {0}")]
    Panicked(String),
}

impl HandlerError {
    /// Short label used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedEvent(_) => "malformed_event",
            Self::Storage(StorageError::BucketNotFound(_)) => "bucket_not_found",
            Self::Storage(StorageError::Read { .. }) => "storage_read_error",
            Self::Storage(StorageError::InvalidEntry { .. } | StorageError::Write { .. }) => {
                "storage_write_error"
            }
            Self::Other(_) => "other",
            Self::Panicked(_) => "panic",
        }
    }
}

// Store methods return anyhow errors; recover the storage category when there is one
impl From<anyhow::Error> for HandlerError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<StorageError>() {
            Ok(storage_err) => HandlerError::Storage(storage_err),
            Err(err) => HandlerError::Other(format!("{err:#}")),
        }
    }
}
