use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

pub const SOURCE_SECRET_ID: &str = "SOURCE_SECRET_ID";
pub const SOURCE_SECRET_KEY: &str = "SOURCE_SECRET_KEY";
pub const SOURCE_REGION: &str = "SOURCE_REGION";
pub const SOURCE_SESSION_TOKEN: &str = "SOURCE_SESSION_TOKEN";
pub const TARGET_SECRET_ID: &str = "TARGET_SECRET_ID";
pub const TARGET_SECRET_KEY: &str = "TARGET_SECRET_KEY";
pub const TARGET_REGION: &str = "TARGET_REGION";
pub const TARGET_SESSION_TOKEN: &str = "TARGET_SESSION_TOKEN";
pub const TARGET_BUCKET: &str = "TARGET_BUCKET";
pub const SYNC_SCRATCH_DIR: &str = "SYNC_SCRATCH_DIR";
pub const STORAGE_TIMEOUT_SECONDS: &str = "STORAGE_TIMEOUT_SECONDS";
pub const COS_ENDPOINT: &str = "COS_ENDPOINT";
pub const FAIL_ON_CHECKSUM_MISMATCH: &str = "FAIL_ON_CHECKSUM_MISMATCH";

pub const DEFAULT_SCRATCH_DIR: &str = "/tmp";
pub const DEFAULT_ENDPOINT_TEMPLATE: &str = "https://cos.{region}.myqcloud.com";

/// Account-scoped access keys for one side of the sync.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_id: String,
    pub access_secret: String,
    pub region: String,
    pub session_token: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_id", &self.access_id)
            .field("access_secret", &"<redacted>")
            .field("region", &self.region)
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// What a checksum mismatch does to the invocation result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChecksumPolicy {
    /// Log the mismatch and still report success.
    #[default]
    Warn,
    /// Log the mismatch and report a degraded result.
    Degrade,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub source: Credentials,
    pub target: Credentials,
    pub target_bucket: String,
    pub scratch_dir: PathBuf,
    /// Operation timeout handed to the storage client.
    pub request_timeout: Option<Duration>,
    /// Endpoint override; `{region}` is substituted per client.
    pub endpoint: Option<String>,
    pub checksum_policy: ChecksumPolicy,
}

impl SyncConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let optional = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let required = |name: &'static str| optional(name).ok_or(ConfigError::Missing { name });

        let source = Credentials {
            access_id: required(SOURCE_SECRET_ID)?,
            access_secret: required(SOURCE_SECRET_KEY)?,
            region: required(SOURCE_REGION)?,
            session_token: optional(SOURCE_SESSION_TOKEN),
        };
        let target = Credentials {
            access_id: required(TARGET_SECRET_ID)?,
            access_secret: required(TARGET_SECRET_KEY)?,
            region: required(TARGET_REGION)?,
            session_token: optional(TARGET_SESSION_TOKEN),
        };
        let target_bucket = required(TARGET_BUCKET)?;

        let request_timeout = optional(STORAGE_TIMEOUT_SECONDS)
            .map(|value| parse_timeout(&value))
            .transpose()?;

        let fail_on_mismatch = optional(FAIL_ON_CHECKSUM_MISMATCH)
            .map(|value| parse_flag(&value))
            .transpose()?
            .unwrap_or(false);
        let checksum_policy = if fail_on_mismatch {
            ChecksumPolicy::Degrade
        } else {
            ChecksumPolicy::Warn
        };

        Ok(Self {
            source,
            target,
            target_bucket,
            scratch_dir: optional(SYNC_SCRATCH_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SCRATCH_DIR)),
            request_timeout,
            endpoint: optional(COS_ENDPOINT),
            checksum_policy,
        })
    }
}

/// Resolves the storage endpoint for a region.
pub fn endpoint_for_region(endpoint: Option<&str>, region: &str) -> String {
    endpoint
        .unwrap_or(DEFAULT_ENDPOINT_TEMPLATE)
        .replace("{region}", region)
}

fn parse_timeout(value: &str) -> Result<Duration, ConfigError> {
    let seconds = value
        .parse::<u64>()
        .map_err(|error| ConfigError::Invalid {
            name: STORAGE_TIMEOUT_SECONDS,
            reason: error.to_string(),
        })?;
    if seconds == 0 {
        return Err(ConfigError::Invalid {
            name: STORAGE_TIMEOUT_SECONDS,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(Duration::from_secs(seconds))
}

fn parse_flag(value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Invalid {
            name: FAIL_ON_CHECKSUM_MISMATCH,
            reason: format!("expected a boolean, got '{other}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn base_env() -> HashMap<&'static str, String> {
        HashMap::from([
            (SOURCE_SECRET_ID, "source-id".to_string()),
            (SOURCE_SECRET_KEY, "source-key".to_string()),
            (SOURCE_REGION, "ap-chengdu".to_string()),
            (TARGET_SECRET_ID, "target-id".to_string()),
            (TARGET_SECRET_KEY, "target-key".to_string()),
            (TARGET_REGION, "ap-guangzhou".to_string()),
            (TARGET_BUCKET, "backup-1250000000".to_string()),
        ])
    }

    fn load(env: &HashMap<&'static str, String>) -> Result<SyncConfig, ConfigError> {
        SyncConfig::from_lookup(|name| env.get(name).cloned())
    }

    #[test]
    fn loads_required_values_with_defaults() {
        let config = load(&base_env()).expect("complete env should load");

        assert_eq!(config.source.access_id, "source-id");
        assert_eq!(config.source.region, "ap-chengdu");
        assert_eq!(config.target.access_secret, "target-key");
        assert_eq!(config.target_bucket, "backup-1250000000");
        assert_eq!(config.scratch_dir, PathBuf::from("/tmp"));
        assert_eq!(config.request_timeout, None);
        assert_eq!(config.endpoint, None);
        assert_eq!(config.checksum_policy, ChecksumPolicy::Warn);
        assert_eq!(config.source.session_token, None);
    }

    #[test]
    fn reports_first_missing_variable() {
        let mut env = base_env();
        env.remove(TARGET_BUCKET);
        assert_eq!(
            load(&env),
            Err(ConfigError::Missing {
                name: TARGET_BUCKET
            })
        );

        let mut env = base_env();
        env.insert(SOURCE_SECRET_KEY, "   ".to_string());
        assert_eq!(
            load(&env),
            Err(ConfigError::Missing {
                name: SOURCE_SECRET_KEY
            })
        );
    }

    #[test]
    fn reads_optional_settings() {
        let mut env = base_env();
        env.insert(SYNC_SCRATCH_DIR, "/mnt/scratch".to_string());
        env.insert(STORAGE_TIMEOUT_SECONDS, "30".to_string());
        env.insert(COS_ENDPOINT, "http://127.0.0.1:9000".to_string());
        env.insert(FAIL_ON_CHECKSUM_MISMATCH, "true".to_string());
        env.insert(TARGET_SESSION_TOKEN, "token".to_string());

        let config = load(&env).expect("optional settings should load");

        assert_eq!(config.scratch_dir, PathBuf::from("/mnt/scratch"));
        assert_eq!(config.request_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.endpoint.as_deref(), Some("http://127.0.0.1:9000"));
        assert_eq!(config.checksum_policy, ChecksumPolicy::Degrade);
        assert_eq!(config.target.session_token.as_deref(), Some("token"));
    }

    #[test]
    fn rejects_invalid_optional_settings() {
        let mut env = base_env();
        env.insert(STORAGE_TIMEOUT_SECONDS, "0".to_string());
        assert!(matches!(
            load(&env),
            Err(ConfigError::Invalid {
                name: STORAGE_TIMEOUT_SECONDS,
                ..
            })
        ));

        let mut env = base_env();
        env.insert(FAIL_ON_CHECKSUM_MISMATCH, "sometimes".to_string());
        assert!(matches!(
            load(&env),
            Err(ConfigError::Invalid {
                name: FAIL_ON_CHECKSUM_MISMATCH,
                ..
            })
        ));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let config = load(&base_env()).expect("complete env should load");
        let rendered = format!("{:?}", config.source);

        assert!(rendered.contains("source-id"));
        assert!(!rendered.contains("source-key"));
    }

    #[test]
    fn endpoint_substitutes_region() {
        assert_eq!(
            endpoint_for_region(None, "ap-chengdu"),
            "https://cos.ap-chengdu.myqcloud.com"
        );
        assert_eq!(
            endpoint_for_region(Some("http://localhost:9000"), "ap-chengdu"),
            "http://localhost:9000"
        );
        assert_eq!(
            endpoint_for_region(Some("https://cos-internal.{region}.example"), "ap-beijing"),
            "https://cos-internal.ap-beijing.example"
        );
    }
}
