//! fv-chunks: fixed-size fragmenting and BLAKE3 content identifiers
//!
//! # Overview
//! - `fragmenter`: pull-based splitting of a source file into fixed-size
//!   fragments, read one byte range at a time
//! - `blake3`: content identifiers for stored blobs (CAS keys)

pub mod blake3;
pub mod fragmenter;

// Convenience re-exports for the most common operations
pub use blake3::{content_id, content_id_matches};
pub use fragmenter::{
    fragment_count, read_fragment, FragmentStream, Fragmenter, DEFAULT_FRAGMENT_SIZE,
};
