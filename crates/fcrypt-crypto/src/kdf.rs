//! Password → cipher key.
//!
//! The key is the SHA-256 digest of the password's UTF-8 bytes, taken
//! once: no salt, no iteration count, no memory hardness. Existing
//! ciphertexts depend on exactly this derivation.

use secrecy::{ExposeSecret, SecretString};

use crate::chacha20::CipherKey;
use crate::framer::Sha256;

/// Derive the ChaCha20 key for `password`.
pub fn derive_key(password: &SecretString) -> CipherKey {
    let digest = Sha256::digest(password.expose_secret().as_bytes());
    CipherKey::from_digest(&digest)
}
