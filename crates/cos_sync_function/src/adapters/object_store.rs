use std::io;
use std::path::Path;

use cos_sync_core::checksum::ObjectChecksum;
use cos_sync_core::config::Credentials;
use thiserror::Error;

/// Transport-level failure reported by a storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct StoreError {
    pub code: String,
    pub message: String,
}

impl StoreError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn local_io(path: &Path, error: io::Error) -> Self {
        Self::new("local_io", format!("{}: {error}", path.display()))
    }
}

/// Object transfers against one account's storage.
pub trait ObjectStore {
    /// Streams `bucket/key` into `destination`, returning the object's checksum.
    fn download_to_file(
        &self,
        bucket: &str,
        key: &str,
        destination: &Path,
    ) -> Result<Option<ObjectChecksum>, StoreError>;

    /// Uploads `source` to `bucket/key`, returning the stored object's checksum.
    fn upload_from_file(
        &self,
        bucket: &str,
        key: &str,
        source: &Path,
    ) -> Result<Option<ObjectChecksum>, StoreError>;
}

/// Builds a store bound to a set of credentials.
pub trait StoreConnector {
    type Store: ObjectStore;

    fn connect(&self, credentials: &Credentials) -> Result<Self::Store, StoreError>;
}
