use serde::{Deserialize, Serialize};

/// Transfer status of a stored fragment.
///
/// `Retry` is a transient marker owned by the orchestrator; `Ok` and
/// `Failed` are terminal. Status only changes through explicit
/// status-update operations, never implicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentStatus {
    Ok,
    Retry,
    Failed,
}

impl FragmentStatus {
    /// A fragment in a terminal state needs no further pipeline work.
    pub fn is_terminal(self) -> bool {
        matches!(self, FragmentStatus::Ok | FragmentStatus::Failed)
    }
}

/// One manifest entry: where a fragment's ciphertext lives and how its
/// last transfer went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentRecord {
    /// Position of the fragment within the source object (0-based)
    pub index: u32,
    /// Content identifier of the encrypted fragment; empty if no store
    /// write was ever acknowledged
    pub cid: String,
    /// Unix timestamp in milliseconds of the last transfer attempt
    pub timestamp: u64,
    pub status: FragmentStatus,
}

impl FragmentRecord {
    pub fn new(index: u32, cid: String, status: FragmentStatus) -> Self {
        Self {
            index,
            cid,
            timestamp: now_millis(),
            status,
        }
    }

    /// Copy of this record with a different status, everything else intact.
    pub fn with_status(&self, status: FragmentStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}

/// Current time as Unix epoch milliseconds.
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
