//! Per-index fragment key derivation
//!
//! Each fragment index maps to a fixed hierarchical path, with the index as
//! the final component:
//!
//! ```text
//! m/44'/60'/0'/0/{index}
//! ```
//!
//! The full path string is the HKDF-SHA256 domain input over the BIP-39
//! seed, so derivation is a pure function of `(secret, index)`. Two
//! manifests are key-compatible iff they agree on this path convention.
//!
//! Path components occupy a 31-bit domain; indices with the hardened bit
//! set are rejected.

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroize;

use fv_core::{FvError, FvResult};

use crate::secret::MasterSecret;
use crate::KEY_SIZE;

/// Account/chain prefix under which all fragment keys live.
pub const DERIVATION_PATH_PREFIX: &str = "m/44'/60'/0'/0";

const HARDENED_BIT: u32 = 1 << 31;

/// A 256-bit key bound to exactly one `(secret, index)` pair.
///
/// Derived on demand, never stored. Zeroized on drop.
#[derive(Clone)]
pub struct FragmentKey {
    bytes: [u8; KEY_SIZE],
    index: u32,
}

impl FragmentKey {
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    /// The fragment index this key was derived for.
    pub fn index(&self) -> u32 {
        self.index
    }
}

impl Drop for FragmentKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for FragmentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FragmentKey")
            .field("index", &self.index)
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// The derivation path for a fragment index.
pub fn derivation_path(index: u32) -> String {
    format!("{DERIVATION_PATH_PREFIX}/{index}")
}

/// Derive the 256-bit key for one fragment index.
///
/// Deterministic: identical inputs always yield identical output. Keys for
/// distinct indices are computationally independent (HKDF with distinct
/// domain inputs), and a key reveals nothing about the seed or index.
pub fn derive_fragment_key(secret: &MasterSecret, index: u32) -> FvResult<FragmentKey> {
    if index & HARDENED_BIT != 0 {
        return Err(FvError::InvalidIndex {
            index,
            reason: "derivation path components must fit in 31 bits".into(),
        });
    }

    let hkdf = Hkdf::<Sha256>::new(None, secret.seed());
    let mut okm = [0u8; KEY_SIZE];
    hkdf.expand(derivation_path(index).as_bytes(), &mut okm)
        .map_err(|e| FvError::Other(anyhow::anyhow!("HKDF expand failed: {e}")))?;

    Ok(FragmentKey { bytes: okm, index })
}
