//! Whole-file ChaCha20 encryption/decryption.
//!
//! Output length always equals input length: no header, no IV, no tag.
//! Running the same password over a ciphertext restores the plaintext.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use fcrypt_core::{FcryptError, FcryptResult};
use fcrypt_crypto::{derive_key, ChaCha20Stream, CipherKey, BLOCK_SIZE};
use secrecy::SecretString;
use thiserror::Error;
use tracing::{debug, info};

use crate::{read_some, IoOptions, ProgressFn};

/// Which side of a stream transform failed
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("read failed: {0}")]
    Read(#[source] std::io::Error),

    #[error("write failed: {0}")]
    Write(#[source] std::io::Error),
}

impl StreamError {
    fn at(self, input: &Path, output: &Path) -> FcryptError {
        match self {
            StreamError::Read(source) => FcryptError::InputRead {
                path: input.to_path_buf(),
                source,
            },
            StreamError::Write(source) => FcryptError::OutputWrite {
                path: output.to_path_buf(),
                source,
            },
        }
    }
}

/// Result of encrypting or decrypting a single file
#[derive(Debug, Clone)]
pub struct CipherReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub bytes: u64,
    /// Keystream blocks consumed
    pub blocks: u64,
}

/// XOR everything `reader` yields with the keystream for `key` and write it
/// to `writer`. Returns the number of bytes transformed.
///
/// The writer is flushed but not synced.
pub fn transform_stream<R: Read, W: Write>(
    mut reader: R,
    mut writer: W,
    key: &CipherKey,
    buffer_size: usize,
    total: u64,
    progress: Option<&ProgressFn>,
) -> Result<u64, StreamError> {
    let mut stream = ChaCha20Stream::new(key);
    let mut buf = vec![0u8; buffer_size.max(1)];
    let mut done = 0u64;

    loop {
        let n = read_some(&mut reader, &mut buf).map_err(StreamError::Read)?;
        if n == 0 {
            break;
        }
        stream.apply_keystream(&mut buf[..n]);
        writer.write_all(&buf[..n]).map_err(StreamError::Write)?;
        done += n as u64;
        if let Some(cb) = progress {
            cb(done, total, "ciphering");
        }
    }
    writer.flush().map_err(StreamError::Write)?;

    debug_assert_eq!(stream.counter().as_u64(), done.div_ceil(BLOCK_SIZE as u64));
    Ok(done)
}

/// Encrypt or decrypt `input` into the new file `output` under `password`.
///
/// Refuses to touch an existing `output`. On a mid-stream failure the
/// partially written output is left in place.
pub fn transform_file(
    input: &Path,
    output: &Path,
    password: &SecretString,
    options: &IoOptions,
    progress: Option<&ProgressFn>,
) -> FcryptResult<CipherReport> {
    let output_exists = output.try_exists().map_err(|source| FcryptError::OutputOpen {
        path: output.to_path_buf(),
        source,
    })?;
    if output_exists {
        return Err(FcryptError::OutputExists {
            path: output.to_path_buf(),
        });
    }

    let reader = File::open(input).map_err(|source| FcryptError::InputOpen {
        path: input.to_path_buf(),
        source,
    })?;
    let total = reader.metadata().map(|m| m.len()).unwrap_or(0);

    // a file created after the check above still fails here with AlreadyExists
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(output)
        .map_err(|source| match source.kind() {
            std::io::ErrorKind::AlreadyExists => FcryptError::OutputExists {
                path: output.to_path_buf(),
            },
            _ => FcryptError::OutputOpen {
                path: output.to_path_buf(),
                source,
            },
        })?;

    debug!(
        input = %input.display(),
        output = %output.display(),
        bytes = total,
        "deriving key and starting keystream"
    );
    let key = derive_key(password);

    let mut writer = BufWriter::with_capacity(options.buffer_size.max(1), file);
    let bytes = transform_stream(
        reader,
        &mut writer,
        &key,
        options.buffer_size,
        total,
        progress,
    )
    .map_err(|e| e.at(input, output))?;

    if options.sync_output {
        let file = writer.into_inner().map_err(|e| FcryptError::OutputWrite {
            path: output.to_path_buf(),
            source: e.into_error(),
        })?;
        file.sync_all().map_err(|source| FcryptError::OutputWrite {
            path: output.to_path_buf(),
            source,
        })?;
    }

    let blocks = bytes.div_ceil(BLOCK_SIZE as u64);
    info!(
        input = %input.display(),
        output = %output.display(),
        bytes,
        blocks,
        "ciphered"
    );
    Ok(CipherReport {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        bytes,
        blocks,
    })
}
