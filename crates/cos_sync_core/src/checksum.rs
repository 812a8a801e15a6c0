use serde::{Deserialize, Serialize};

/// Content identifier returned by the storage service (ETag).
///
/// Stored normalised: surrounding quotes and whitespace removed, lowercased, so
/// `"\"ABC\""` from one account compares equal to `abc` from another.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectChecksum(String);

impl ObjectChecksum {
    /// Returns `None` when the raw header carries no value.
    pub fn from_etag(raw: &str) -> Option<Self> {
        let normalized = raw.trim().trim_matches('"').trim();
        if normalized.is_empty() {
            return None;
        }
        Some(Self(normalized.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecksumVerdict {
    Match,
    Mismatch,
    /// At least one side returned no checksum.
    Unverified,
}

impl ChecksumVerdict {
    pub fn compare(source: Option<&ObjectChecksum>, target: Option<&ObjectChecksum>) -> Self {
        match (source, target) {
            (Some(source), Some(target)) if source == target => Self::Match,
            (Some(_), Some(_)) => Self::Mismatch,
            _ => Self::Unverified,
        }
    }
}
