//! Fixed-size source fragmenting
//!
//! Splits a source file into fragments of exactly `chunk_size` bytes (the
//! last one may be shorter). Boundaries are positional, not content-defined:
//! the fragment index is the correlation key between key derivation and
//! manifest entries, so it must not move when bytes change.
//!
//! The stream is pull-based: each `next()` performs one bounded-size read,
//! so the source is never loaded fully into memory and the caller controls
//! pacing. It is forward-only; start a fresh stream for a second pass.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use fv_core::{FvError, FvResult};
use tracing::debug;

/// Default fragment size: 5 MiB
pub const DEFAULT_FRAGMENT_SIZE: usize = 5 * 1024 * 1024;

/// Number of fragments a source of `source_size` bytes yields:
/// `ceil(source_size / chunk_size)`.
pub fn fragment_count(source_size: u64, chunk_size: usize) -> u32 {
    if source_size == 0 {
        0
    } else {
        ((source_size - 1) / chunk_size as u64 + 1) as u32
    }
}

/// Splits sources into fixed-size fragments.
#[derive(Debug, Clone, Copy)]
pub struct Fragmenter {
    chunk_size: usize,
}

impl Default for Fragmenter {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_FRAGMENT_SIZE,
        }
    }
}

impl Fragmenter {
    pub fn new(chunk_size: usize) -> FvResult<Self> {
        if chunk_size == 0 {
            return Err(FvError::Other(anyhow::anyhow!(
                "fragment size must be greater than zero"
            )));
        }
        Ok(Self { chunk_size })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Open `path` and return a stream of its fragments in ascending order.
    ///
    /// The source size is fixed at open time; if the file shrinks while the
    /// stream is being consumed, the stream yields one `Io` error and ends
    /// without a partial final fragment.
    pub fn fragment(&self, path: &Path) -> FvResult<FragmentStream> {
        let file = File::open(path)?;
        let size = file.metadata()?.len();

        debug!(
            path = %path.display(),
            size,
            fragments = fragment_count(size, self.chunk_size),
            "fragmenting source"
        );

        Ok(FragmentStream {
            file,
            chunk_size: self.chunk_size,
            remaining: size,
            failed: false,
        })
    }
}

/// Ordered, lazy sequence of fragments from one source.
///
/// Yields `FvResult<Vec<u8>>`; fuses after the first error.
pub struct FragmentStream {
    file: File,
    chunk_size: usize,
    remaining: u64,
    failed: bool,
}

impl FragmentStream {
    /// Fragments left to yield, assuming no read error.
    pub fn remaining_fragments(&self) -> u32 {
        fragment_count(self.remaining, self.chunk_size)
    }
}

impl Iterator for FragmentStream {
    type Item = FvResult<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.remaining == 0 {
            return None;
        }

        let take = self.remaining.min(self.chunk_size as u64) as usize;
        let mut buf = vec![0u8; take];

        match self.file.read_exact(&mut buf) {
            Ok(()) => {
                self.remaining -= take as u64;
                Some(Ok(buf))
            }
            Err(e) => {
                // Source unreadable or shrunk mid-read. No partial fragment.
                self.failed = true;
                Some(Err(FvError::Io(e)))
            }
        }
    }
}

/// Read the single fragment at `index` as a byte-range scoped read.
///
/// Used by resume to re-read exactly the ranges whose transfer did not
/// settle, without re-streaming the whole source.
pub fn read_fragment(path: &Path, index: u32, chunk_size: usize) -> FvResult<Vec<u8>> {
    let mut file = File::open(path)?;
    let size = file.metadata()?.len();

    let start = index as u64 * chunk_size as u64;
    if start >= size {
        return Err(FvError::InvalidIndex {
            index,
            reason: format!("fragment starts at byte {start}, but source is {size} bytes"),
        });
    }

    let take = (size - start).min(chunk_size as u64) as usize;
    file.seek(SeekFrom::Start(start))?;

    let mut buf = vec![0u8; take];
    file.read_exact(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_source(dir: &TempDir, name: &str, content: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::File::create(&path)
            .unwrap()
            .write_all(content)
            .unwrap();
        path
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        assert!(Fragmenter::new(0).is_err());
    }

    #[test]
    fn empty_source_yields_no_fragments() {
        let tmp = TempDir::new().unwrap();
        let src = write_source(&tmp, "empty.bin", b"");

        let stream = Fragmenter::new(16).unwrap().fragment(&src).unwrap();
        assert_eq!(stream.count(), 0);
    }

    #[test]
    fn exact_multiple_has_full_final_fragment() {
        let tmp = TempDir::new().unwrap();
        let src = write_source(&tmp, "even.bin", &[7u8; 64]);

        let stream = Fragmenter::new(16).unwrap().fragment(&src).unwrap();
        assert_eq!(stream.remaining_fragments(), 4);

        let chunks: Vec<_> = stream.collect::<FvResult<_>>().unwrap();

        assert_eq!(chunks.len(), 4);
        assert!(chunks.iter().all(|c| c.len() == 16));
    }

    #[test]
    fn last_fragment_is_the_remainder() {
        let tmp = TempDir::new().unwrap();
        let src = write_source(&tmp, "odd.bin", &[1u8; 70]);

        let chunks: Vec<_> = Fragmenter::new(16)
            .unwrap()
            .fragment(&src)
            .unwrap()
            .collect::<FvResult<_>>()
            .unwrap();

        assert_eq!(chunks.len(), 5);
        assert_eq!(chunks[4].len(), 70 % 16);
    }

    #[test]
    fn concatenation_reproduces_source() {
        let tmp = TempDir::new().unwrap();
        let content: Vec<u8> = (0u8..=255).cycle().take(10_000).collect();
        let src = write_source(&tmp, "data.bin", &content);

        let mut reassembled = Vec::new();
        for chunk in Fragmenter::new(4096).unwrap().fragment(&src).unwrap() {
            reassembled.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(reassembled, content);
    }

    #[test]
    fn shrinking_source_errors_without_partial_fragment() {
        let tmp = TempDir::new().unwrap();
        let src = write_source(&tmp, "shrink.bin", &[9u8; 100]);

        let mut stream = Fragmenter::new(32).unwrap().fragment(&src).unwrap();
        assert_eq!(stream.next().unwrap().unwrap().len(), 32);

        // Truncate under the stream's feet
        std::fs::File::create(&src).unwrap().set_len(40).unwrap();

        // 32..64 still within the truncated size may succeed depending on
        // the page cache, but the stream must eventually yield Err and then
        // fuse rather than produce a short chunk.
        let rest: Vec<_> = stream.by_ref().collect();
        assert!(rest.iter().any(|r| r.is_err()), "shrink must surface an error");
        assert!(rest.iter().all(|r| match r {
            Ok(c) => c.len() == 32,
            Err(_) => true,
        }));
        assert!(stream.next().is_none(), "stream must fuse after error");
    }

    #[test]
    fn read_fragment_matches_stream_output() {
        let tmp = TempDir::new().unwrap();
        let content: Vec<u8> = (0u8..200).collect();
        let src = write_source(&tmp, "ranged.bin", &content);

        let chunks: Vec<_> = Fragmenter::new(64)
            .unwrap()
            .fragment(&src)
            .unwrap()
            .collect::<FvResult<_>>()
            .unwrap();

        for (i, chunk) in chunks.iter().enumerate() {
            let ranged = read_fragment(&src, i as u32, 64).unwrap();
            assert_eq!(&ranged, chunk);
        }
    }

    #[test]
    fn read_fragment_beyond_end_is_invalid_index() {
        let tmp = TempDir::new().unwrap();
        let src = write_source(&tmp, "short.bin", &[0u8; 10]);

        let err = read_fragment(&src, 5, 16).unwrap_err();
        assert!(matches!(err, FvError::InvalidIndex { index: 5, .. }));
    }

    proptest! {
        /// ceil law: count * chunk_size covers the source, (count-1) doesn't
        #[test]
        fn fragment_count_is_ceil(size in 0u64..1_000_000, chunk in 1usize..100_000) {
            let n = fragment_count(size, chunk) as u64;
            prop_assert!(n * chunk as u64 >= size);
            if n > 0 {
                prop_assert!(((n - 1) * chunk as u64) < size);
            } else {
                prop_assert_eq!(size, 0);
            }
        }

        /// All fragments are chunk_size except a shorter last one, and they
        /// concatenate back to the source
        #[test]
        fn stream_lengths_and_roundtrip(
            content in proptest::collection::vec(any::<u8>(), 0..=8192),
            chunk in 1usize..2048,
        ) {
            let tmp = TempDir::new().unwrap();
            let src = write_source(&tmp, "prop.bin", &content);

            let chunks: Vec<_> = Fragmenter::new(chunk).unwrap()
                .fragment(&src).unwrap()
                .collect::<FvResult<_>>()
                .unwrap();

            prop_assert_eq!(chunks.len() as u32, fragment_count(content.len() as u64, chunk));
            for (i, c) in chunks.iter().enumerate() {
                if i + 1 < chunks.len() {
                    prop_assert_eq!(c.len(), chunk);
                } else {
                    prop_assert!(c.len() <= chunk && !c.is_empty());
                }
            }
            let reassembled: Vec<u8> = chunks.concat();
            prop_assert_eq!(reassembled, content);
        }
    }
}
