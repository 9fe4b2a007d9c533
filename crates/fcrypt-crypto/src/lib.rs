//! fcrypt-crypto: SHA-256 and ChaCha20 for password-based file encryption
//!
//! Pipeline:
//! ```text
//! password ─► SHA-256 ─► 256-bit key ─► ChaCha20 keystream (counter = block index) ─► XOR
//! file     ─► framer ─► SHA-256 compression ─► digest ─► hex
//! ```
//!
//! The key derivation is a single unsalted digest and words 14..16 of the
//! ChaCha20 state are a fixed constant, so equal passwords and equal
//! plaintexts give equal ciphertexts. This is not an IND-CPA scheme.

pub mod chacha20;
pub mod encode;
pub mod framer;
pub mod kdf;
pub mod sha256;
pub mod stream;

pub use chacha20::{CipherKey, StateMatrix};
pub use framer::{BitLength, Sha256};
pub use kdf::derive_key;
pub use sha256::Digest;
pub use stream::{BlockCounter, ChaCha20Stream};

/// Size of a SHA-256 message block and of a ChaCha20 keystream block
pub const BLOCK_SIZE: usize = 64;

/// Size of a cipher key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;
