//! Shared cross-account object sync domain primitives.
//!
//! This crate owns the event contract, object location derivation, environment
//! configuration and the sync result envelope. It intentionally excludes the
//! storage SDK and function runtime concerns, which live in `cos_sync_function`.

pub mod checksum;
pub mod config;
pub mod contract;
pub mod error;
pub mod location;
pub mod scratch;
