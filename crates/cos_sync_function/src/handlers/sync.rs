use std::path::Path;

use cos_sync_core::checksum::{ChecksumVerdict, ObjectChecksum};
use cos_sync_core::config::SyncConfig;
use cos_sync_core::contract::{SyncEvent, SyncResult, TransferState};
use cos_sync_core::error::{ConfigError, SyncError};
use cos_sync_core::location::ObjectLocation;
use cos_sync_core::scratch::ScratchFile;
use tracing::{error, info, warn};

use crate::adapters::object_store::{ObjectStore, StoreConnector};

const COMPONENT: &str = "sync_handler";

/// Copies the object named by the first event record from the source account
/// to the target bucket.
///
/// Every outcome is folded into a [`SyncResult`]; the scratch copy is gone by
/// the time this returns.
pub fn handle_sync_event(
    event: &SyncEvent,
    config: &SyncConfig,
    connector: &impl StoreConnector,
) -> SyncResult {
    match sync_first_record(event, config, connector) {
        Ok(state) => {
            let result = SyncResult::completed(&state, config.checksum_policy);
            info!(
                component = COMPONENT,
                event = "sync_completed",
                bucket = %state.location.bucket,
                key = %state.location.key,
                target_bucket = %state.target_bucket,
                status = ?result.status,
                succeeded = result.is_success(),
            );
            result
        }
        Err(sync_error) => {
            error!(
                component = COMPONENT,
                event = "sync_failed",
                error_code = sync_error.code(),
                error = %sync_error,
                cause = sync_error.cause().unwrap_or_default(),
            );
            SyncResult::failure(&sync_error)
        }
    }
}

/// Entry point for one invocation.
///
/// An event without records is answered before configuration is loaded, so an
/// empty event reports `No records found` even when the environment is
/// incomplete.
pub fn handle_sync_invocation<C, L, B>(
    event: &SyncEvent,
    load_config: L,
    build_connector: B,
) -> Result<SyncResult, ConfigError>
where
    C: StoreConnector,
    L: FnOnce() -> Result<SyncConfig, ConfigError>,
    B: FnOnce(&SyncConfig) -> C,
{
    if event.records.is_empty() {
        warn!(component = COMPONENT, event = "no_records");
        return Ok(SyncResult::failure(&SyncError::NoRecords));
    }

    let config = load_config()?;
    let connector = build_connector(&config);
    Ok(handle_sync_event(event, &config, &connector))
}

fn sync_first_record(
    event: &SyncEvent,
    config: &SyncConfig,
    connector: &impl StoreConnector,
) -> Result<TransferState, SyncError> {
    let record = event.records.first().ok_or(SyncError::NoRecords)?;
    if event.records.len() > 1 {
        warn!(
            component = COMPONENT,
            event = "extra_records_ignored",
            records = event.records.len(),
        );
    }

    let location = ObjectLocation::from_record(record);
    let local_path = location.scratch_path(&config.scratch_dir)?;
    info!(
        component = COMPONENT,
        event = "sync_started",
        bucket = %location.bucket,
        key = %location.key,
        local_path = %local_path.display(),
    );

    let scratch = ScratchFile::new(local_path);
    let source_checksum = download(&location, scratch.path(), config, connector)?;
    let target_checksum = upload(&location, scratch.path(), config, connector)?;

    let state = TransferState {
        location,
        target_bucket: config.target_bucket.clone(),
        local_path: scratch.path().to_path_buf(),
        source_checksum,
        target_checksum,
    };
    report_checksum(&state);
    release_scratch(scratch);

    Ok(state)
}

fn download(
    location: &ObjectLocation,
    local_path: &Path,
    config: &SyncConfig,
    connector: &impl StoreConnector,
) -> Result<Option<ObjectChecksum>, SyncError> {
    let transfer = connector.connect(&config.source).and_then(|store| {
        store.download_to_file(&location.bucket, &location.key, local_path)
    });

    match transfer {
        Ok(checksum) => {
            info!(
                component = COMPONENT,
                event = "download_completed",
                bucket = %location.bucket,
                key = %location.key,
                checksum = checksum.as_ref().map(ObjectChecksum::as_str).unwrap_or_default(),
            );
            Ok(checksum)
        }
        Err(store_error) => {
            error!(
                component = COMPONENT,
                event = "download_failed",
                bucket = %location.bucket,
                key = %location.key,
                code = %store_error.code,
                message = %store_error.message,
            );
            Err(SyncError::DownloadFailed {
                key: location.key.clone(),
                bucket: location.bucket.clone(),
                cause: store_error.to_string(),
            })
        }
    }
}

fn upload(
    location: &ObjectLocation,
    local_path: &Path,
    config: &SyncConfig,
    connector: &impl StoreConnector,
) -> Result<Option<ObjectChecksum>, SyncError> {
    let transfer = connector.connect(&config.target).and_then(|store| {
        store.upload_from_file(&config.target_bucket, &location.key, local_path)
    });

    match transfer {
        Ok(checksum) => {
            info!(
                component = COMPONENT,
                event = "upload_completed",
                bucket = %config.target_bucket,
                key = %location.key,
                checksum = checksum.as_ref().map(ObjectChecksum::as_str).unwrap_or_default(),
            );
            Ok(checksum)
        }
        Err(store_error) => {
            error!(
                component = COMPONENT,
                event = "upload_failed",
                bucket = %config.target_bucket,
                key = %location.key,
                code = %store_error.code,
                message = %store_error.message,
            );
            Err(SyncError::UploadFailed {
                key: location.key.clone(),
                bucket: config.target_bucket.clone(),
                cause: store_error.to_string(),
            })
        }
    }
}

fn report_checksum(state: &TransferState) {
    let source = state
        .source_checksum
        .as_ref()
        .map(ObjectChecksum::as_str)
        .unwrap_or_default();
    let target = state
        .target_checksum
        .as_ref()
        .map(ObjectChecksum::as_str)
        .unwrap_or_default();

    match state.checksum_verdict() {
        ChecksumVerdict::Match => {}
        ChecksumVerdict::Mismatch => warn!(
            component = COMPONENT,
            event = "checksum_mismatch",
            key = %state.location.key,
            source_checksum = source,
            target_checksum = target,
        ),
        ChecksumVerdict::Unverified => warn!(
            component = COMPONENT,
            event = "checksum_unverified",
            key = %state.location.key,
            source_checksum = source,
            target_checksum = target,
        ),
    }
}

fn release_scratch(scratch: ScratchFile) {
    let path = scratch.path().to_path_buf();
    match scratch.remove() {
        Ok(()) => info!(
            component = COMPONENT,
            event = "scratch_removed",
            path = %path.display(),
        ),
        Err(remove_error) => warn!(
            component = COMPONENT,
            event = "scratch_cleanup_failed",
            path = %path.display(),
            error = %remove_error,
        ),
    }
}
