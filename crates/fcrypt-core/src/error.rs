use std::path::PathBuf;

use thiserror::Error;

pub type FcryptResult<T> = Result<T, FcryptError>;

#[derive(Debug, Error)]
pub enum FcryptError {
    #[error("unsupported platform: {0}")]
    Platform(String),

    #[error("could not open input file {} for reading: {source}", .path.display())]
    InputOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("output file {} already exists", .path.display())]
    OutputExists { path: PathBuf },

    #[error("could not open output file {} for writing: {source}", .path.display())]
    OutputOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error reading from input file {}: {source}", .path.display())]
    InputRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error writing to output file {}: {source}", .path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {0}")]
    Config(String),

    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    #[error("digest mismatch for {}: expected {expected}, got {actual}", .path.display())]
    DigestMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FcryptError {
    /// Process exit status for this error. Every fatal kind gets its own code.
    pub fn exit_code(&self) -> u8 {
        match self {
            FcryptError::Other(_) | FcryptError::Io(_) => 1,
            FcryptError::Platform(_) => 10,
            FcryptError::InputOpen { .. } => 11,
            FcryptError::OutputExists { .. } => 12,
            FcryptError::OutputOpen { .. } => 13,
            FcryptError::InputRead { .. } => 14,
            FcryptError::OutputWrite { .. } => 15,
            FcryptError::Config(_) => 16,
            FcryptError::InvalidDigest(_) | FcryptError::DigestMismatch { .. } => 17,
        }
    }
}

/// Startup sanity check on the integer widths the digest and cipher rely on:
/// 8-bit bytes, 32-bit words with modular wraparound, and a 64-bit bit-length
/// accumulator built from two words.
pub fn check_platform() -> FcryptResult<()> {
    if u8::BITS != 8 || std::mem::size_of::<u8>() != 1 || 0u8.wrapping_sub(1) != 0xFF {
        return Err(FcryptError::Platform(format!(
            "expected 8-bit bytes, found {} bits",
            u8::BITS
        )));
    }
    if u32::BITS != 32 || std::mem::size_of::<u32>() != 4 || 0u32.wrapping_sub(1) != 0xFFFF_FFFF {
        return Err(FcryptError::Platform(format!(
            "expected 32-bit words, found {} bits",
            u32::BITS
        )));
    }
    if ((u64::from(u32::MAX) << 32) | u64::from(u32::MAX)) != u64::MAX {
        return Err(FcryptError::Platform(
            "64-bit counters cannot be assembled from two 32-bit halves".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn platform_check_passes() {
        check_platform().unwrap();
    }

    #[test]
    fn exit_codes_are_distinct_per_kind() {
        let path = PathBuf::from("f.bin");
        let io_err = || io::Error::other("boom");
        let errors = [
            FcryptError::Platform("x".into()),
            FcryptError::InputOpen {
                path: path.clone(),
                source: io_err(),
            },
            FcryptError::OutputExists { path: path.clone() },
            FcryptError::OutputOpen {
                path: path.clone(),
                source: io_err(),
            },
            FcryptError::InputRead {
                path: path.clone(),
                source: io_err(),
            },
            FcryptError::OutputWrite {
                path: path.clone(),
                source: io_err(),
            },
            FcryptError::Config("x".into()),
            FcryptError::InvalidDigest("x".into()),
        ];

        let mut codes: Vec<u8> = errors.iter().map(FcryptError::exit_code).collect();
        assert!(codes.iter().all(|&c| c != 0));
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len(), "each fatal kind needs its own status");
    }

    #[test]
    fn messages_name_the_path() {
        let err = FcryptError::OutputExists { path: PathBuf::from("/tmp/out.enc") };
        assert_eq!(err.to_string(), "output file /tmp/out.enc already exists");

        let err = FcryptError::InputOpen {
            path: PathBuf::from("missing.txt"),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.to_string().contains("missing.txt"));
    }
}
