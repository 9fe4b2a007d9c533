//! SHA-256 hashing of files and readers

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use fcrypt_core::{FcryptError, FcryptResult};
use fcrypt_crypto::{Digest, Sha256};
use tracing::{debug, info};

use crate::{read_some, IoOptions, ProgressFn};

/// Result of hashing a single file
#[derive(Debug, Clone)]
pub struct HashReport {
    pub path: PathBuf,
    pub digest: Digest,
    pub bytes: u64,
}

/// Hash everything `reader` yields, reading `buffer_size` bytes at a time.
///
/// `total` is only used for progress reporting (0 if unknown).
pub fn hash_reader<R: Read>(
    mut reader: R,
    buffer_size: usize,
    total: u64,
    progress: Option<&ProgressFn>,
) -> std::io::Result<(Digest, u64)> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; buffer_size.max(1)];
    let mut done = 0u64;

    loop {
        let n = read_some(&mut reader, &mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        done += n as u64;
        if let Some(cb) = progress {
            cb(done, total, "hashing");
        }
    }

    Ok((hasher.finalize(), done))
}

/// Hash a file from disk with the streaming hasher.
pub fn hash_file(
    path: &Path,
    options: &IoOptions,
    progress: Option<&ProgressFn>,
) -> FcryptResult<HashReport> {
    let file = File::open(path).map_err(|source| FcryptError::InputOpen {
        path: path.to_path_buf(),
        source,
    })?;
    let total = file.metadata().map(|m| m.len()).unwrap_or(0);
    debug!(path = %path.display(), bytes = total, "hashing");

    let (digest, bytes) =
        hash_reader(file, options.buffer_size, total, progress).map_err(|source| {
            FcryptError::InputRead {
                path: path.to_path_buf(),
                source,
            }
        })?;

    info!(path = %path.display(), bytes, digest = %digest, "hashed");
    Ok(HashReport {
        path: path.to_path_buf(),
        digest,
        bytes,
    })
}
