//! Process-wide state shared by every invocation served from one instance.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Once;

use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info";

static TRACING_INIT: Once = Once::new();
static COLD_START: AtomicBool = AtomicBool::new(true);

/// Installs the JSON tracing subscriber. Later calls are no-ops.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
        let _ = tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .with_current_span(false)
            .try_init();
    });
}

/// Returns `true` exactly once per process: for the cold-start invocation.
pub fn take_cold_start() -> bool {
    COLD_START.swap(false, Ordering::AcqRel)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cold_start_is_reported_once() {
        let first = take_cold_start();
        let second = take_cold_start();

        assert!(first);
        assert!(!second);
    }

    #[test]
    fn tracing_init_is_idempotent() {
        init_tracing();
        init_tracing();
        tracing::info!(component = "runtime", event = "init_checked");
    }
}
