//! fv-crypto: per-fragment encryption for fragvault
//!
//! Architecture: Fragment-then-Encrypt with AES-256-GCM
//!
//! Pipeline: source → fixed-size fragment → encrypt (per-index key) → BLAKE3
//! content id → store
//!
//! Key hierarchy:
//! ```text
//! Master Secret (BIP-39 phrase → 64-byte seed)
//!   └── Fragment Key (per-index, 256-bit):
//!       HKDF-SHA256(seed, info = "m/44'/60'/0'/0/{index}")
//!       └── Fragment AEAD: AES-256-GCM
//!           (nonce = random 96-bit per call, tag = 128-bit)
//! ```
//!
//! Derivation is a pure function of `(secret, index)`: no randomness, no
//! external state. The same index always re-derives the same key, which is
//! what lets a retried upload re-encrypt under a fresh nonce and still
//! decrypt later.

pub mod cipher;
pub mod derive;
pub mod secret;

pub use cipher::{decrypt_fragment, encrypt_fragment};
pub use derive::{derivation_path, derive_fragment_key, FragmentKey, DERIVATION_PATH_PREFIX};
pub use secret::MasterSecret;

/// Size of a fragment key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of an AES-GCM nonce (96-bit)
pub const NONCE_SIZE: usize = 12;

/// Size of a GCM authentication tag (128-bit)
pub const TAG_SIZE: usize = 16;

/// Size of a BIP-39 seed in bytes
pub const SEED_SIZE: usize = 64;
