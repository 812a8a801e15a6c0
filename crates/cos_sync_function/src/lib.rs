//! COS-backed adapters and the function handler for cross-account object sync.
//!
//! `handlers::sync` runs one download/upload/verify cycle per invocation against
//! whatever `adapters::object_store::StoreConnector` it is given; `adapters::cos`
//! is the production connector and `runtime` holds per-process setup. Event
//! contracts, configuration and key derivation live in `cos_sync_core`.

pub mod adapters;
pub mod handlers;
pub mod runtime;
