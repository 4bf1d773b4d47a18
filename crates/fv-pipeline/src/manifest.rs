//! Object manifest: ordered fragment records with transfer status
//!
//! Persisted form (JSON):
//! ```text
//! {
//!   "objectId": "...",
//!   "createdAt": 1700000000000,
//!   "fragments": [
//!     { "index": 0, "cid": "...", "timestamp": 1700000000000, "status": "ok" },
//!     ...
//!   ]
//! }
//! ```
//!
//! Manifests are immutable values: every mutation returns a new manifest,
//! so concurrent readers never observe a half-applied update. Records are
//! held in ascending index order and indices are unique; no record is ever
//! silently dropped.

use serde::{Deserialize, Serialize};
use std::path::Path;

use fv_core::{now_millis, FragmentRecord, FragmentStatus, FvError, FvResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Identifier of the logical object these fragments belong to
    pub object_id: String,
    /// Unix timestamp in milliseconds, fixed at creation
    pub created_at: u64,
    /// Fragment records in ascending index order
    pub fragments: Vec<FragmentRecord>,
}

impl Manifest {
    /// Create a manifest for one object from the given records.
    ///
    /// Records are stored verbatim (the orchestrator supplies cid,
    /// timestamp, and status per record), ordered by index. Duplicate
    /// indices are an error. An empty record list is a valid manifest.
    pub fn new(object_id: impl Into<String>, mut records: Vec<FragmentRecord>) -> FvResult<Self> {
        records.sort_by_key(|r| r.index);
        check_unique_indices(&records)?;

        Ok(Self {
            object_id: object_id.into(),
            created_at: now_millis(),
            fragments: records,
        })
    }

    /// The record for `index`, if present.
    pub fn record(&self, index: u32) -> Option<&FragmentRecord> {
        self.fragments
            .binary_search_by_key(&index, |r| r.index)
            .ok()
            .map(|pos| &self.fragments[pos])
    }

    /// New manifest with the record at `index` carrying `status`; all
    /// other fields and records unchanged. Unknown indices are an error,
    /// never a silent no-op.
    pub fn with_status(&self, index: u32, status: FragmentStatus) -> FvResult<Self> {
        let pos = self
            .fragments
            .binary_search_by_key(&index, |r| r.index)
            .map_err(|_| FvError::UnknownFragment { index })?;

        let mut fragments = self.fragments.clone();
        fragments[pos] = fragments[pos].with_status(status);

        Ok(Self {
            object_id: self.object_id.clone(),
            created_at: self.created_at,
            fragments,
        })
    }

    /// New manifest with the record matching `record.index` replaced
    /// wholesale (fresh cid/timestamp/status after a re-upload).
    pub fn with_record(&self, record: FragmentRecord) -> FvResult<Self> {
        let pos = self
            .fragments
            .binary_search_by_key(&record.index, |r| r.index)
            .map_err(|_| FvError::UnknownFragment {
                index: record.index,
            })?;

        let mut fragments = self.fragments.clone();
        fragments[pos] = record;

        Ok(Self {
            object_id: self.object_id.clone(),
            created_at: self.created_at,
            fragments,
        })
    }

    /// Every fragment has reached a terminal state (`ok` or `failed`).
    pub fn is_complete(&self) -> bool {
        self.fragments.iter().all(|r| r.status.is_terminal())
    }

    /// Every fragment transferred successfully.
    pub fn is_fully_stored(&self) -> bool {
        self.fragments
            .iter()
            .all(|r| r.status == FragmentStatus::Ok)
    }

    /// Records still needing pipeline work: anything not `ok`. A `retry`
    /// marker survives a crash mid-flight; `failed` records are eligible
    /// for re-upload from the source bytes.
    pub fn unsettled(&self) -> Vec<&FragmentRecord> {
        self.fragments
            .iter()
            .filter(|r| r.status != FragmentStatus::Ok)
            .collect()
    }

    /// Serialize to the persisted JSON form.
    pub fn to_bytes(&self) -> FvResult<Vec<u8>> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| FvError::Serialization(format!("serializing manifest: {e}")))
    }

    /// Parse the persisted JSON form. Malformed input and duplicate
    /// indices are rejected.
    pub fn from_bytes(data: &[u8]) -> FvResult<Self> {
        let mut manifest: Manifest = serde_json::from_slice(data)
            .map_err(|e| FvError::Serialization(format!("parsing manifest: {e}")))?;

        manifest.fragments.sort_by_key(|r| r.index);
        check_unique_indices(&manifest.fragments)?;
        Ok(manifest)
    }

    /// Persist to `path` atomically (tmp file + rename).
    pub fn save(&self, path: &Path) -> FvResult<()> {
        let bytes = self.to_bytes()?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let tmp = path.with_extension("fv_tmp");
        std::fs::write(&tmp, &bytes)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Load a previously saved manifest.
    pub fn load(path: &Path) -> FvResult<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}

fn check_unique_indices(records: &[FragmentRecord]) -> FvResult<()> {
    for pair in records.windows(2) {
        if pair[0].index == pair[1].index {
            return Err(FvError::Serialization(format!(
                "duplicate fragment index {} in manifest",
                pair[0].index
            )));
        }
    }
    Ok(())
}
