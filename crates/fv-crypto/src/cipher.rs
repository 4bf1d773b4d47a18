//! Fragment AEAD: AES-256-GCM
//!
//! Encrypted fragment format (binary):
//! ```text
//! [12 bytes: random nonce][N bytes: ciphertext][16 bytes: GCM tag]
//! ```
//!
//! Nonce and tag sit at fixed offsets so any conforming reader can parse
//! the structure without external metadata. The nonce is freshly random on
//! every call — encrypting the same plaintext twice under the same key must
//! yield different bytes, since nonce reuse under GCM breaks the AEAD.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::RngCore;

use fv_core::{FvError, FvResult};

use crate::derive::FragmentKey;
use crate::{NONCE_SIZE, TAG_SIZE};

/// Encrypt a single fragment under its per-index key.
///
/// Returns `[12-byte nonce][ciphertext][16-byte tag]`. Empty plaintexts are
/// valid and produce a 28-byte output.
pub fn encrypt_fragment(plaintext: &[u8], key: &FragmentKey) -> FvResult<Vec<u8>> {
    let cipher = Aes256Gcm::new(key.as_bytes().into());

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| FvError::Other(anyhow::anyhow!("fragment encryption failed: {e}")))?;

    let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    result.extend_from_slice(&nonce_bytes);
    result.extend_from_slice(&ciphertext);
    Ok(result)
}

/// Decrypt a single fragment.
///
/// Input: `[12-byte nonce][ciphertext][16-byte tag]` (output of
/// `encrypt_fragment`). Fails with an authentication error on tag mismatch
/// (tampering, wrong key, or corruption) — never returns partial plaintext.
pub fn decrypt_fragment(encrypted: &[u8], key: &FragmentKey) -> FvResult<Vec<u8>> {
    if encrypted.len() < NONCE_SIZE + TAG_SIZE {
        // Too short to even hold a nonce and tag: corrupted in transit
        return Err(FvError::Authentication { index: key.index() });
    }

    let (nonce_bytes, ciphertext) = encrypted.split_at(NONCE_SIZE);
    let nonce = Nonce::from_slice(nonce_bytes);
    let cipher = Aes256Gcm::new(key.as_bytes().into());

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| FvError::Authentication { index: key.index() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::derive_fragment_key;
    use crate::secret::MasterSecret;
    use proptest::prelude::*;

    fn test_key(index: u32) -> FragmentKey {
        let (_, secret) = MasterSecret::generate().unwrap();
        derive_fragment_key(&secret, index).unwrap()
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let key = test_key(0);
        let plaintext = b"hello, encrypted fragment!";

        let encrypted = encrypt_fragment(plaintext, &key).unwrap();
        let decrypted = decrypt_fragment(&encrypted, &key).unwrap();

        assert_eq!(&decrypted, plaintext);
    }

    #[test]
    fn encrypt_decrypt_empty() {
        let key = test_key(0);

        let encrypted = encrypt_fragment(b"", &key).unwrap();
        assert_eq!(encrypted.len(), NONCE_SIZE + TAG_SIZE);

        let decrypted = decrypt_fragment(&encrypted, &key).unwrap();
        assert_eq!(decrypted, b"");
    }

    #[test]
    fn fresh_nonce_every_call() {
        let key = test_key(0);
        let plaintext = b"same bytes in, different bytes out";

        let a = encrypt_fragment(plaintext, &key).unwrap();
        let b = encrypt_fragment(plaintext, &key).unwrap();

        assert_ne!(a, b);
        assert_ne!(a[..NONCE_SIZE], b[..NONCE_SIZE]);
    }

    #[test]
    fn decrypt_wrong_key_fails() {
        let k1 = test_key(0);
        let k2 = test_key(0); // different secret

        let encrypted = encrypt_fragment(b"secret data", &k1).unwrap();
        let result = decrypt_fragment(&encrypted, &k2);

        assert!(matches!(result, Err(FvError::Authentication { index: 0 })));
    }

    #[test]
    fn cross_index_key_fails() {
        let (_, secret) = MasterSecret::generate().unwrap();
        let k0 = derive_fragment_key(&secret, 0).unwrap();
        let k1 = derive_fragment_key(&secret, 1).unwrap();

        let encrypted = encrypt_fragment(b"bound to index 0", &k0).unwrap();
        let result = decrypt_fragment(&encrypted, &k1);

        assert!(matches!(result, Err(FvError::Authentication { index: 1 })));
    }

    #[test]
    fn tampered_ciphertext_fails_not_garbles() {
        let key = test_key(3);
        let mut encrypted = encrypt_fragment(b"integrity matters", &key).unwrap();

        // Flip one bit in the ciphertext body
        encrypted[NONCE_SIZE] ^= 0x01;

        let result = decrypt_fragment(&encrypted, &key);
        assert!(matches!(result, Err(FvError::Authentication { index: 3 })));
    }

    #[test]
    fn tampered_tag_fails() {
        let key = test_key(0);
        let mut encrypted = encrypt_fragment(b"tag check", &key).unwrap();

        let last = encrypted.len() - 1;
        encrypted[last] ^= 0x80;

        assert!(decrypt_fragment(&encrypted, &key).is_err());
    }

    #[test]
    fn truncated_input_is_rejected() {
        let key = test_key(0);
        assert!(decrypt_fragment(&[0u8; NONCE_SIZE + TAG_SIZE - 1], &key).is_err());
        assert!(decrypt_fragment(b"", &key).is_err());
    }

    #[test]
    fn encrypted_size() {
        let key = test_key(0);
        let plaintext = vec![0u8; 1000];

        let encrypted = encrypt_fragment(&plaintext, &key).unwrap();

        // nonce (12) + plaintext (1000) + tag (16)
        assert_eq!(encrypted.len(), 12 + 1000 + 16);
    }

    #[test]
    fn same_plaintext_different_indices_different_ciphertexts() {
        let (_, secret) = MasterSecret::generate().unwrap();
        let k0 = derive_fragment_key(&secret, 0).unwrap();
        let k1 = derive_fragment_key(&secret, 1).unwrap();

        let a = encrypt_fragment(b"identical plaintext", &k0).unwrap();
        let b = encrypt_fragment(b"identical plaintext", &k1).unwrap();
        assert_ne!(a, b);
    }

    proptest! {
        /// Round-trip law for arbitrary byte sequences
        #[test]
        fn roundtrip_arbitrary(data in proptest::collection::vec(any::<u8>(), 0..=4096)) {
            let key = test_key(0);
            let encrypted = encrypt_fragment(&data, &key).unwrap();
            let decrypted = decrypt_fragment(&encrypted, &key).unwrap();
            prop_assert_eq!(decrypted, data);
        }

        /// Any single flipped bit anywhere in the blob fails authentication
        #[test]
        fn bitflip_anywhere_fails(
            data in proptest::collection::vec(any::<u8>(), 1..=256),
            pos_seed in any::<usize>(),
            bit in 0u8..8,
        ) {
            let key = test_key(0);
            let mut encrypted = encrypt_fragment(&data, &key).unwrap();
            let pos = pos_seed % encrypted.len();
            encrypted[pos] ^= 1 << bit;
            prop_assert!(decrypt_fragment(&encrypted, &key).is_err());
        }
    }
}
