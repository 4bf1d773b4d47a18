//! BLAKE3 content identifiers
//!
//! A stored blob is addressed by the BLAKE3 hash of its bytes, displayed as
//! 64 hex chars. Identical bytes always map to the same id, which is what
//! makes `put` idempotent.

use fv_core::{FvError, FvResult};

/// Content identifier for a blob: lowercase BLAKE3 hex (64 chars).
pub fn content_id(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

/// Parse a content id back into a hash digest.
pub fn parse_content_id(cid: &str) -> FvResult<blake3::Hash> {
    blake3::Hash::from_hex(cid)
        .map_err(|e| FvError::Store(format!("invalid content id '{cid}': {e}")))
}

/// Whether `data` hashes to `cid`. Unparseable ids never match.
pub fn content_id_matches(data: &[u8], cid: &str) -> bool {
    match parse_content_id(cid) {
        // blake3::Hash equality is constant-time
        Ok(expected) => blake3::hash(data) == expected,
        Err(_) => false,
    }
}
