use chrono::Utc;
use cos_sync_core::config::SyncConfig;
use cos_sync_core::contract::{SyncEvent, SyncResult};
use cos_sync_function::adapters::cos::CosConnector;
use cos_sync_function::handlers::sync::handle_sync_invocation;
use cos_sync_function::runtime;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

async fn handle_request(event: LambdaEvent<Value>) -> Result<SyncResult, Error> {
    let (payload, context) = event.into_parts();
    tracing::info!(
        component = "sync_function",
        event = "invocation_received",
        request_id = %context.request_id,
        cold_start = runtime::take_cold_start(),
        received_at = %Utc::now().to_rfc3339(),
    );

    let sync_event = SyncEvent::from_payload(payload)
        .map_err(|error| Error::from(format!("invalid sync event: {error}")))?;
    let result =
        handle_sync_invocation(&sync_event, SyncConfig::from_env, CosConnector::from_config)
            .map_err(|error| Error::from(error.to_string()))?;

    tracing::info!(
        component = "sync_function",
        event = "invocation_completed",
        succeeded = result.is_success(),
    );
    Ok(result)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    runtime::init_tracing();
    lambda_runtime::run(service_fn(handle_request)).await
}
