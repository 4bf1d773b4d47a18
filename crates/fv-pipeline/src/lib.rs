//! fv-pipeline: the fragment lifecycle orchestrator
//!
//! Drives one object end to end: fragment the source, derive a per-index
//! key, encrypt, store, and record each fragment in a manifest. The
//! manifest is the durable artifact; fragments exist only transiently
//! while in flight.
//!
//! Per-fragment state machine:
//! ```text
//! pending → ok
//! pending → retry → ok
//! pending → retry* → failed
//! ```
//!
//! Partial completion is representable: a manifest with `failed` or
//! `retry` records can be persisted, reloaded, and settled later with
//! [`engine::resume_object`].

pub mod engine;
pub mod manifest;

pub use engine::{
    download_object, resume_object, upload_object, verify_object, UploadReport,
};
pub use manifest::Manifest;
