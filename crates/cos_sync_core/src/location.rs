use std::path::{Path, PathBuf};

use crate::contract::ObjectChangeRecord;
use crate::error::SyncError;

/// Remote address of the object a record points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    pub fn from_record(record: &ObjectChangeRecord) -> Self {
        Self {
            bucket: source_bucket_name(&record.bucket_name, &record.account_id),
            key: strip_bucket_prefix(&record.object_key, &record.account_id, &record.bucket_name)
                .to_string(),
        }
    }

    /// Last path segment of the key, used as the scratch file name.
    pub fn file_name(&self) -> Result<&str, SyncError> {
        let name = self.key.rsplit('/').next().unwrap_or_default();
        match name {
            "" => Err(SyncError::InvalidRecord {
                reason: format!("object key '{}' has no file name", self.key),
            }),
            "." | ".." => Err(SyncError::InvalidRecord {
                reason: format!("object key '{}' ends in a relative path segment", self.key),
            }),
            _ => Ok(name),
        }
    }

    pub fn scratch_path(&self, scratch_dir: &Path) -> Result<PathBuf, SyncError> {
        Ok(scratch_dir.join(self.file_name()?))
    }
}

/// COS bucket names are addressed as `{name}-{appid}`.
pub fn source_bucket_name(bucket_name: &str, account_id: &str) -> String {
    if account_id.is_empty() || bucket_name.ends_with(&format!("-{account_id}")) {
        return bucket_name.to_string();
    }
    format!("{bucket_name}-{account_id}")
}

/// Removes the `/{appid}/{bucketName}/` prefix trigger events put in front of keys.
///
/// The bucket name may be given with or without its `-{appid}` suffix. Keys
/// without the prefix are returned with leading slashes trimmed.
pub fn strip_bucket_prefix<'a>(key: &'a str, account_id: &str, bucket_name: &str) -> &'a str {
    let trimmed = key.trim_start_matches('/');
    if account_id.is_empty() {
        return trimmed;
    }

    let short_name = bucket_name
        .strip_suffix(&format!("-{account_id}"))
        .unwrap_or(bucket_name);

    for name in [bucket_name, short_name] {
        let prefix = format!("{account_id}/{name}/");
        if let Some(remainder) = trimmed.strip_prefix(prefix.as_str()) {
            return remainder;
        }
    }

    trimmed
}
