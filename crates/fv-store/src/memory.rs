//! In-process content-addressed store

use std::collections::HashMap;
use std::sync::Mutex;

use fv_core::{FvError, FvResult};
use fv_chunks::content_id;

use crate::ContentStore;

/// A content-addressed blob map held in memory.
///
/// Blobs are keyed by the BLAKE3 hex of their bytes, so storing identical
/// bytes twice is a no-op that returns the same id.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct blobs held.
    pub fn len(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, cid: &str) -> bool {
        self.blobs.lock().unwrap().contains_key(cid)
    }

    /// Drop a blob. Test hook for simulating backend data loss.
    pub fn remove(&self, cid: &str) -> Option<Vec<u8>> {
        self.blobs.lock().unwrap().remove(cid)
    }

    /// Overwrite the bytes behind an id without re-hashing. Test hook for
    /// simulating backend corruption.
    pub fn corrupt(&self, cid: &str, bytes: Vec<u8>) {
        self.blobs.lock().unwrap().insert(cid.to_string(), bytes);
    }
}

impl ContentStore for MemoryStore {
    async fn put(&self, bytes: Vec<u8>) -> FvResult<String> {
        let cid = content_id(&bytes);
        self.blobs.lock().unwrap().insert(cid.clone(), bytes);
        Ok(cid)
    }

    async fn get(&self, cid: &str) -> FvResult<Vec<u8>> {
        self.blobs
            .lock()
            .unwrap()
            .get(cid)
            .cloned()
            .ok_or_else(|| FvError::NotFound(cid.to_string()))
    }
}
