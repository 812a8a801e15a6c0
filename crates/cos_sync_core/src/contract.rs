use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::checksum::{ChecksumVerdict, ObjectChecksum};
use crate::config::ChecksumPolicy;
use crate::error::{EventError, SyncError};
use crate::location::ObjectLocation;

pub const SUCCESS_MESSAGE: &str = "Sync File Success";
pub const DEGRADED_MESSAGE: &str = "Sync File Success with checksum mismatch";

/// Storage-change event delivered to the function. Only the first record is synced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<ObjectChangeRecord>,
}

impl SyncEvent {
    /// Decodes an invocation payload, unwrapping an HTTP-style `body` envelope first.
    pub fn from_payload(payload: Value) -> Result<Self, EventError> {
        let event = unwrap_body_envelope(payload)?;
        Ok(serde_json::from_value(event)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RecordWire", rename_all = "camelCase")]
pub struct ObjectChangeRecord {
    #[serde(rename = "bucketAppId")]
    pub account_id: String,
    pub bucket_name: String,
    pub object_key: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecordWire {
    Trigger { cos: TriggerEntity },
    Flat(FlatRecord),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TriggerEntity {
    cos_bucket: TriggerBucket,
    cos_object: TriggerObject,
}

#[derive(Debug, Deserialize)]
struct TriggerBucket {
    appid: AccountId,
    name: String,
}

#[derive(Debug, Deserialize)]
struct TriggerObject {
    key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlatRecord {
    #[serde(alias = "accountId")]
    bucket_app_id: AccountId,
    #[serde(alias = "sourceBucketName")]
    bucket_name: String,
    object_key: String,
}

/// Account ids arrive as strings from the trigger and occasionally as numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AccountId {
    Text(String),
    Number(u64),
}

impl From<AccountId> for String {
    fn from(value: AccountId) -> Self {
        match value {
            AccountId::Text(text) => text,
            AccountId::Number(number) => number.to_string(),
        }
    }
}

impl From<RecordWire> for ObjectChangeRecord {
    fn from(wire: RecordWire) -> Self {
        match wire {
            RecordWire::Trigger { cos } => Self {
                account_id: cos.cos_bucket.appid.into(),
                bucket_name: cos.cos_bucket.name,
                object_key: cos.cos_object.key,
            },
            RecordWire::Flat(record) => Self {
                account_id: record.bucket_app_id.into(),
                bucket_name: record.bucket_name,
                object_key: record.object_key,
            },
        }
    }
}

fn unwrap_body_envelope(event: Value) -> Result<Value, EventError> {
    let Some(object) = event.as_object() else {
        return Err(EventError::Envelope(
            "Invocation payload must be a JSON object".to_string(),
        ));
    };

    let Some(body) = object.get("body") else {
        return Ok(event);
    };

    match body {
        Value::Null => Ok(json!({})),
        Value::Object(_) => Ok(body.clone()),
        Value::String(text) => Ok(serde_json::from_str(text)?),
        _ => Err(EventError::Envelope(
            "Request body must be a JSON object".to_string(),
        )),
    }
}

/// Per-invocation transfer bookkeeping. Never shared across invocations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferState {
    pub location: ObjectLocation,
    pub target_bucket: String,
    pub local_path: PathBuf,
    pub source_checksum: Option<ObjectChecksum>,
    pub target_checksum: Option<ObjectChecksum>,
}

impl TransferState {
    pub fn checksum_verdict(&self) -> ChecksumVerdict {
        ChecksumVerdict::compare(self.source_checksum.as_ref(), self.target_checksum.as_ref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Success,
    Degraded,
    Failure,
}

/// Normalised function response.
///
/// `errorMsg` mirrors `message` on failures so callers reading the historical
/// `{"errorMsg": ...}` shape keep working.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub status: SyncStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_msg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_bucket: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_checksum: Option<ObjectChecksum>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_checksum: Option<ObjectChecksum>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<ChecksumVerdict>,
}

impl SyncResult {
    pub fn completed(state: &TransferState, policy: ChecksumPolicy) -> Self {
        let verdict = state.checksum_verdict();
        let degraded = verdict == ChecksumVerdict::Mismatch && policy == ChecksumPolicy::Degrade;
        let (status, message) = if degraded {
            (SyncStatus::Degraded, DEGRADED_MESSAGE)
        } else {
            (SyncStatus::Success, SUCCESS_MESSAGE)
        };

        Self {
            status,
            message: message.to_string(),
            error_msg: None,
            error_code: None,
            bucket: Some(state.location.bucket.clone()),
            key: Some(state.location.key.clone()),
            target_bucket: Some(state.target_bucket.clone()),
            source_checksum: state.source_checksum.clone(),
            target_checksum: state.target_checksum.clone(),
            checksum: Some(verdict),
        }
    }

    pub fn failure(error: &SyncError) -> Self {
        let message = error.to_string();
        let (bucket, key) = match error {
            SyncError::DownloadFailed { key, bucket, .. }
            | SyncError::UploadFailed { key, bucket, .. } => {
                (Some(bucket.clone()), Some(key.clone()))
            }
            SyncError::NoRecords | SyncError::InvalidRecord { .. } => (None, None),
        };

        Self {
            status: SyncStatus::Failure,
            message: message.clone(),
            error_msg: Some(message),
            error_code: Some(error.code().to_string()),
            bucket,
            key,
            target_bucket: None,
            source_checksum: None,
            target_checksum: None,
            checksum: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == SyncStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state(source: &str, target: &str) -> TransferState {
        TransferState {
            location: ObjectLocation {
                bucket: "woody-chengdu-1307427535".to_string(),
                key: "data/861_8606717.png".to_string(),
            },
            target_bucket: "backup-1250000000".to_string(),
            local_path: PathBuf::from("/tmp/861_8606717.png"),
            source_checksum: ObjectChecksum::from_etag(source),
            target_checksum: ObjectChecksum::from_etag(target),
        }
    }

    #[test]
    fn decodes_flat_records() {
        let event = SyncEvent::from_payload(json!({
            "Records": [
                {
                    "bucketAppId": "1307427535",
                    "bucketName": "woody-chengdu",
                    "objectKey": "data/861_8606717.png"
                }
            ]
        }))
        .expect("flat event should decode");

        assert_eq!(
            event.records,
            vec![ObjectChangeRecord {
                account_id: "1307427535".to_string(),
                bucket_name: "woody-chengdu".to_string(),
                object_key: "data/861_8606717.png".to_string(),
            }]
        );
    }

    #[test]
    fn decodes_cos_trigger_records() {
        let event = SyncEvent::from_payload(json!({
            "Records": [
                {
                    "cos": {
                        "cosSchemaVersion": "1.0",
                        "cosObject": {
                            "url": "http://woody-chengdu-1307427535.cos.ap-chengdu.myqcloud.com/data/861_8606717.png",
                            "meta": {"Content-Type": "image/png"},
                            "key": "/1307427535/woody-chengdu/data/861_8606717.png",
                            "size": 1024
                        },
                        "cosBucket": {
                            "region": "cd",
                            "name": "woody-chengdu",
                            "appid": "1307427535"
                        },
                        "cosNotificationId": "unkown"
                    },
                    "event": {
                        "eventName": "cos:ObjectCreated:Put",
                        "eventVersion": "1.0",
                        "eventTime": 1700000000,
                        "eventSource": "qcs::cos"
                    }
                }
            ]
        }))
        .expect("trigger event should decode");

        let record = &event.records[0];
        assert_eq!(record.account_id, "1307427535");
        assert_eq!(record.bucket_name, "woody-chengdu");
        assert_eq!(
            record.object_key,
            "/1307427535/woody-chengdu/data/861_8606717.png"
        );
    }

    #[test]
    fn accepts_numeric_account_ids_and_aliases() {
        let event = SyncEvent::from_payload(json!({
            "Records": [
                {"accountId": 1307427535u64, "sourceBucketName": "woody-chengdu", "objectKey": "a.png"}
            ]
        }))
        .expect("aliased record should decode");

        assert_eq!(event.records[0].account_id, "1307427535");
        assert_eq!(event.records[0].bucket_name, "woody-chengdu");
    }

    #[test]
    fn missing_records_decode_as_empty() {
        let event = SyncEvent::from_payload(json!({})).expect("empty event should decode");
        assert!(event.records.is_empty());
    }

    #[test]
    fn unwraps_string_body_envelope() {
        let body = json!({
            "Records": [
                {"bucketAppId": "1", "bucketName": "b", "objectKey": "k"}
            ]
        })
        .to_string();

        let event = SyncEvent::from_payload(json!({ "body": body }))
            .expect("string body should decode");
        assert_eq!(event.records.len(), 1);
    }

    #[test]
    fn rejects_non_object_payloads() {
        let error = SyncEvent::from_payload(json!([1, 2, 3])).expect_err("array should fail");
        assert!(error.to_string().contains("must be a JSON object"));

        let error = SyncEvent::from_payload(json!({"body": 42})).expect_err("number body");
        assert!(error.to_string().contains("Request body must be a JSON object"));
    }

    #[test]
    fn serialized_record_decodes_back() {
        let record = ObjectChangeRecord {
            account_id: "1307427535".to_string(),
            bucket_name: "woody-chengdu".to_string(),
            object_key: "data/861_8606717.png".to_string(),
        };
        let value = serde_json::to_value(&record).expect("record should serialize");

        assert_eq!(value["bucketAppId"], "1307427535");
        assert_eq!(value["bucketName"], "woody-chengdu");
        assert_eq!(value["objectKey"], "data/861_8606717.png");
    }

    #[test]
    fn no_records_result_keeps_legacy_error_field() {
        let result = SyncResult::failure(&SyncError::NoRecords);
        let value = serde_json::to_value(&result).expect("result should serialize");

        assert_eq!(value["status"], "failure");
        assert_eq!(value["errorMsg"], "No records found");
        assert_eq!(value["errorCode"], "no_records");
        assert!(value.get("bucket").is_none());
    }

    #[test]
    fn mismatch_stays_success_under_warn_policy() {
        let result = SyncResult::completed(&sample_state("aaa", "bbb"), ChecksumPolicy::Warn);

        assert_eq!(result.status, SyncStatus::Success);
        assert_eq!(result.message, SUCCESS_MESSAGE);
        assert_eq!(result.checksum, Some(ChecksumVerdict::Mismatch));
        assert!(result.error_msg.is_none());
    }

    #[test]
    fn mismatch_degrades_under_degrade_policy() {
        let result = SyncResult::completed(&sample_state("aaa", "bbb"), ChecksumPolicy::Degrade);
        assert_eq!(result.status, SyncStatus::Degraded);

        let matched = SyncResult::completed(&sample_state("aaa", "AAA"), ChecksumPolicy::Degrade);
        assert_eq!(matched.status, SyncStatus::Success);
        assert_eq!(matched.checksum, Some(ChecksumVerdict::Match));
    }
}
