//! BIP-39 master secret
//!
//! The master secret is the root of the key tree: a 12-word BIP-39 phrase
//! expanded into a 64-byte seed. The phrase is what the user keeps; this
//! crate never persists either form.

use bip39::Mnemonic;
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroize;

use fv_core::{FvError, FvResult};

use crate::SEED_SIZE;

/// Root entropy for per-fragment key derivation.
///
/// Seed bytes are zeroized on drop.
pub struct MasterSecret {
    phrase: SecretString,
    seed: [u8; SEED_SIZE],
}

impl MasterSecret {
    /// Validate a BIP-39 phrase (word list + checksum) and expand its seed.
    pub fn from_phrase(phrase: &str) -> FvResult<Self> {
        let mnemonic: Mnemonic = phrase
            .parse()
            .map_err(|e| FvError::InvalidSecret(format!("invalid BIP-39 phrase: {e}")))?;

        Ok(Self {
            phrase: SecretString::from(phrase.to_string()),
            seed: mnemonic.to_seed(""),
        })
    }

    /// Generate a fresh 12-word phrase (128-bit entropy) and its secret.
    ///
    /// The phrase is returned for display to the user exactly once; it is
    /// their only recovery path.
    pub fn generate() -> FvResult<(String, Self)> {
        let mut entropy = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut entropy);

        let mnemonic = Mnemonic::from_entropy(&entropy)
            .map_err(|e| FvError::InvalidSecret(format!("BIP-39 generation failed: {e}")))?;

        let words = mnemonic.to_string();
        let secret = Self {
            phrase: SecretString::from(words.clone()),
            seed: mnemonic.to_seed(""),
        };
        Ok((words, secret))
    }

    /// The recovery phrase this secret was built from.
    pub fn phrase(&self) -> &str {
        self.phrase.expose_secret()
    }

    pub(crate) fn seed(&self) -> &[u8; SEED_SIZE] {
        &self.seed
    }
}

impl Drop for MasterSecret {
    fn drop(&mut self) {
        self.seed.zeroize();
    }
}

impl std::fmt::Debug for MasterSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterSecret")
            .field("phrase", &"[REDACTED]")
            .field("seed", &"[REDACTED]")
            .finish()
    }
}
