//! fv-store: content-addressable storage for encrypted fragments
//!
//! The pipeline consumes storage through the [`ContentStore`] contract:
//! `put` is idempotent (identical bytes yield the same id, since the id is
//! a content hash) and `get` fails with `NotFound` for unknown ids.
//!
//! Backends:
//! - `memory`: in-process map, the test and single-process collaborator
//! - `operator`: OpenDAL-backed adapter for S3-compatible endpoints

pub mod memory;
pub mod operator;

pub use memory::MemoryStore;
pub use operator::{build_operator, OpendalStore};

use fv_core::FvResult;

/// Contract the pipeline consumes: content-addressed `put`/`get`.
///
/// Timeouts, transport retries, and backoff are the backend's concern; the
/// pipeline only distinguishes success, not-found, and generic failure.
#[allow(async_fn_in_trait)]
pub trait ContentStore: Sync {
    /// Store a blob, returning its content identifier. Idempotent.
    async fn put(&self, bytes: Vec<u8>) -> FvResult<String>;

    /// Fetch a blob by content identifier; `NotFound` if unknown.
    async fn get(&self, cid: &str) -> FvResult<Vec<u8>>;
}
