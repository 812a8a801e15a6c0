use thiserror::Error;

/// Terminal failures of a single sync invocation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("No records found")]
    NoRecords,

    #[error("Invalid record: {reason}")]
    InvalidRecord { reason: String },

    #[error("Download File Failed, key: {key}, bucket: {bucket}")]
    DownloadFailed {
        key: String,
        bucket: String,
        cause: String,
    },

    #[error("Upload File Failed, key: {key}, bucket: {bucket}")]
    UploadFailed {
        key: String,
        bucket: String,
        cause: String,
    },
}

impl SyncError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoRecords => "no_records",
            Self::InvalidRecord { .. } => "invalid_record",
            Self::DownloadFailed { .. } => "download_failed",
            Self::UploadFailed { .. } => "upload_failed",
        }
    }

    /// Underlying storage failure, when the error came from a transfer.
    pub fn cause(&self) -> Option<&str> {
        match self {
            Self::DownloadFailed { cause, .. } | Self::UploadFailed { cause, .. } => Some(cause),
            Self::NoRecords | Self::InvalidRecord { .. } => None,
        }
    }
}

/// Errors raised while decoding an invocation payload into a sync event.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("{0}")]
    Envelope(String),

    #[error("malformed sync event: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{name} must be configured")]
    Missing { name: &'static str },

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}
