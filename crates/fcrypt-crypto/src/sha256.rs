//! SHA-256 compression function (FIPS 180-4 §6.2.2)
//!
//! `compress` is a pure function over one 64-byte block and the running
//! 8-word state. Padding and length framing live in [`crate::framer`].

use std::fmt;

use fcrypt_core::{FcryptError, FcryptResult};

use crate::encode::{words_from_be_bytes, words_to_be_bytes};
use crate::BLOCK_SIZE;

/// Size of a SHA-256 digest in bytes
pub const DIGEST_SIZE: usize = 32;

/// Round constants: first 32 bits of the fractional parts of the cube roots
/// of the first 64 primes.
const K: [u32; 64] = [
    0x428a2f98, 0x71374491, 0xb5c0fbcf, 0xe9b5dba5, 0x3956c25b, 0x59f111f1, 0x923f82a4, 0xab1c5ed5,
    0xd807aa98, 0x12835b01, 0x243185be, 0x550c7dc3, 0x72be5d74, 0x80deb1fe, 0x9bdc06a7, 0xc19bf174,
    0xe49b69c1, 0xefbe4786, 0x0fc19dc6, 0x240ca1cc, 0x2de92c6f, 0x4a7484aa, 0x5cb0a9dc, 0x76f988da,
    0x983e5152, 0xa831c66d, 0xb00327c8, 0xbf597fc7, 0xc6e00bf3, 0xd5a79147, 0x06ca6351, 0x14292967,
    0x27b70a85, 0x2e1b2138, 0x4d2c6dfc, 0x53380d13, 0x650a7354, 0x766a0abb, 0x81c2c92e, 0x92722c85,
    0xa2bfe8a1, 0xa81a664b, 0xc24b8b70, 0xc76c51a3, 0xd192e819, 0xd6990624, 0xf40e3585, 0x106aa070,
    0x19a4c116, 0x1e376c08, 0x2748774c, 0x34b0bcb5, 0x391c0cb3, 0x4ed8aa4a, 0x5b9cca4f, 0x682e6ff3,
    0x748f82ee, 0x78a5636f, 0x84c87814, 0x8cc70208, 0x90befffa, 0xa4506ceb, 0xbef9a3f7, 0xc67178f2,
];

/// Initial hash value H(0)
pub const INITIAL_STATE: [u32; 8] = [
    0x6a09e667, 0xbb67ae85, 0x3c6ef372, 0xa54ff53a, 0x510e527f, 0x9b05688c, 0x1f83d9ab, 0x5be0cd19,
];

#[inline(always)]
fn small_sigma0(x: u32) -> u32 {
    x.rotate_right(7) ^ x.rotate_right(18) ^ (x >> 3)
}

#[inline(always)]
fn small_sigma1(x: u32) -> u32 {
    x.rotate_right(17) ^ x.rotate_right(19) ^ (x >> 10)
}

#[inline(always)]
fn big_sigma0(x: u32) -> u32 {
    x.rotate_right(2) ^ x.rotate_right(13) ^ x.rotate_right(22)
}

#[inline(always)]
fn big_sigma1(x: u32) -> u32 {
    x.rotate_right(6) ^ x.rotate_right(11) ^ x.rotate_right(25)
}

#[inline(always)]
fn choose(e: u32, f: u32, g: u32) -> u32 {
    (e & f) ^ (!e & g)
}

#[inline(always)]
fn majority(a: u32, b: u32, c: u32) -> u32 {
    (a & b) ^ (a & c) ^ (b & c)
}

/// Expand one block into the 64-word message schedule.
fn schedule(block: &[u8; BLOCK_SIZE]) -> [u32; 64] {
    let head: [u32; 16] = words_from_be_bytes(block);
    let mut w = [0u32; 64];
    w[..16].copy_from_slice(&head);
    for i in 16..64 {
        w[i] = w[i - 16]
            .wrapping_add(small_sigma0(w[i - 15]))
            .wrapping_add(w[i - 7])
            .wrapping_add(small_sigma1(w[i - 2]));
    }
    w
}

/// Fold one 64-byte block into `state`.
pub fn compress(state: &mut [u32; 8], block: &[u8; BLOCK_SIZE]) {
    let w = schedule(block);
    let [mut a, mut b, mut c, mut d, mut e, mut f, mut g, mut h] = *state;

    for i in 0..64 {
        let t1 = h
            .wrapping_add(big_sigma1(e))
            .wrapping_add(choose(e, f, g))
            .wrapping_add(K[i])
            .wrapping_add(w[i]);
        let t2 = big_sigma0(a).wrapping_add(majority(a, b, c));

        h = g;
        g = f;
        f = e;
        e = d.wrapping_add(t1);
        d = c;
        c = b;
        b = a;
        a = t1.wrapping_add(t2);
    }

    for (s, v) in state.iter_mut().zip([a, b, c, d, e, f, g, h]) {
        *s = s.wrapping_add(v);
    }
}

/// A finished SHA-256 digest, displayed as 64 lowercase hex chars.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u32; 8]);

impl Digest {
    pub fn from_words(words: [u32; 8]) -> Self {
        Self(words)
    }

    pub fn words(&self) -> &[u32; 8] {
        &self.0
    }

    /// The 32 digest bytes, each word big-endian.
    pub fn to_bytes(&self) -> [u8; DIGEST_SIZE] {
        words_to_be_bytes(&self.0)
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|w| format!("{w:08x}")).collect()
    }

    /// Parse a 64-char hex string (either case).
    pub fn from_hex(hex: &str) -> FcryptResult<Self> {
        let hex = hex.trim();
        if hex.len() != 2 * DIGEST_SIZE || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(FcryptError::InvalidDigest(format!(
                "expected {} hex chars, got '{hex}'",
                2 * DIGEST_SIZE
            )));
        }
        let mut words = [0u32; 8];
        for (word, chunk) in words.iter_mut().zip(hex.as_bytes().chunks_exact(8)) {
            // all-ASCII was checked above, so the chunk is valid UTF-8
            let text = std::str::from_utf8(chunk)
                .map_err(|e| FcryptError::InvalidDigest(e.to_string()))?;
            *word = u32::from_str_radix(text, 16)
                .map_err(|e| FcryptError::InvalidDigest(format!("'{text}': {e}")))?;
        }
        Ok(Self(words))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for w in &self.0 {
            write!(f, "{w:08x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({self})")
    }
}
