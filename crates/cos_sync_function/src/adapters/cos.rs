use std::fmt::Debug;
use std::future::Future;
use std::path::Path;
use std::time::Duration;

use aws_config::BehaviorVersion;
use aws_sdk_s3::config::timeout::TimeoutConfig;
use aws_sdk_s3::config::{
    Credentials as SdkCredentials, Region, RequestChecksumCalculation, ResponseChecksumValidation,
};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use cos_sync_core::checksum::ObjectChecksum;
use cos_sync_core::config::{endpoint_for_region, Credentials, SyncConfig};
use tokio::io::AsyncWriteExt;

use crate::adapters::object_store::{ObjectStore, StoreConnector, StoreError};

const CREDENTIALS_PROVIDER_NAME: &str = "cos-sync-env";

/// Connects S3-compatible clients to COS endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CosConnector {
    endpoint: Option<String>,
    request_timeout: Option<Duration>,
}

impl CosConnector {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            request_timeout: config.request_timeout,
        }
    }

    pub fn endpoint_url(&self, region: &str) -> Result<String, StoreError> {
        let endpoint = endpoint_for_region(self.endpoint.as_deref(), region);
        if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
            return Err(StoreError::new(
                "invalid_endpoint",
                format!("endpoint '{endpoint}' must start with http:// or https://"),
            ));
        }
        Ok(endpoint)
    }
}

impl StoreConnector for CosConnector {
    type Store = CosObjectStore;

    fn connect(&self, credentials: &Credentials) -> Result<CosObjectStore, StoreError> {
        let endpoint = self.endpoint_url(&credentials.region)?;
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(credentials.region.clone()))
            .credentials_provider(SdkCredentials::new(
                &credentials.access_id,
                &credentials.access_secret,
                credentials.session_token.clone(),
                None,
                CREDENTIALS_PROVIDER_NAME,
            ))
            .endpoint_url(endpoint);

        if let Some(timeout) = self.request_timeout {
            loader = loader.timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(timeout)
                    .build(),
            );
        }

        let sdk_config = block_on(loader.load());
        // COS rejects the default CRC trailers the SDK adds to uploads.
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
            .response_checksum_validation(ResponseChecksumValidation::WhenRequired)
            .build();

        Ok(CosObjectStore {
            s3_client: aws_sdk_s3::Client::from_conf(s3_config),
        })
    }
}

pub struct CosObjectStore {
    s3_client: aws_sdk_s3::Client,
}

impl ObjectStore for CosObjectStore {
    fn download_to_file(
        &self,
        bucket: &str,
        key: &str,
        destination: &Path,
    ) -> Result<Option<ObjectChecksum>, StoreError> {
        let client = self.s3_client.clone();

        block_on(async move {
            let response = client
                .get_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map_err(sdk_error)?;
            let checksum = response.e_tag().and_then(ObjectChecksum::from_etag);

            if let Some(parent) = destination.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|error| StoreError::local_io(parent, error))?;
            }

            let mut file = tokio::fs::File::create(destination)
                .await
                .map_err(|error| StoreError::local_io(destination, error))?;
            let mut body = response.body.into_async_read();
            tokio::io::copy(&mut body, &mut file)
                .await
                .map_err(|error| StoreError::new("body_stream", error.to_string()))?;
            file.flush()
                .await
                .map_err(|error| StoreError::local_io(destination, error))?;

            Ok(checksum)
        })
    }

    fn upload_from_file(
        &self,
        bucket: &str,
        key: &str,
        source: &Path,
    ) -> Result<Option<ObjectChecksum>, StoreError> {
        let client = self.s3_client.clone();

        block_on(async move {
            let body = ByteStream::from_path(source).await.map_err(|error| {
                StoreError::new("local_io", format!("{}: {error}", source.display()))
            })?;
            let response = client
                .put_object()
                .bucket(bucket)
                .key(key)
                .body(body)
                .send()
                .await
                .map_err(sdk_error)?;

            Ok(response.e_tag().and_then(ObjectChecksum::from_etag))
        })
    }
}

fn block_on<F: Future>(future: F) -> F::Output {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

fn sdk_error<E, R>(error: SdkError<E, R>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: Debug,
{
    let code = error.code().unwrap_or("transport_error").to_string();
    let message = error
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| DisplayErrorContext(&error).to_string());
    StoreError::new(code, message)
}
