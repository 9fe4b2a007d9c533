//! fcrypt-file: file-level hashing and encryption
//!
//! - `hash`: stream a file through SHA-256 and report the digest
//! - `cipher`: derive a key from a password and XOR a file with the
//!   ChaCha20 keystream into a new output file
//!
//! Reads and writes go through a caller-sized buffer; the crypto layer
//! regroups bytes into 64-byte blocks itself.

pub mod cipher;
pub mod hash;

use fcrypt_core::FcryptConfig;

pub use cipher::{transform_file, transform_stream, CipherReport, StreamError};
pub use hash::{hash_file, hash_reader, HashReport};

/// Progress callback type (bytes_done, bytes_total, message)
pub type ProgressFn = Box<dyn Fn(u64, u64, &str) + Send + Sync>;

/// I/O tuning shared by the hash and cipher pipelines.
#[derive(Debug, Clone)]
pub struct IoOptions {
    /// Read/write buffer size in bytes
    pub buffer_size: usize,
    /// fsync the output file after the final flush
    pub sync_output: bool,
}

impl Default for IoOptions {
    fn default() -> Self {
        Self {
            buffer_size: 64 * 1024,
            sync_output: false,
        }
    }
}

impl From<&FcryptConfig> for IoOptions {
    fn from(config: &FcryptConfig) -> Self {
        Self {
            buffer_size: config.io.buffer_size,
            sync_output: config.io.sync_output,
        }
    }
}

/// One `read` call, retried on `Interrupted`.
pub(crate) fn read_some<R: std::io::Read>(
    reader: &mut R,
    buf: &mut [u8],
) -> std::io::Result<usize> {
    loop {
        match reader.read(buf) {
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}
