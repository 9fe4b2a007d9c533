//! ChaCha20 block function (RFC 8439 §2.3) with a 64-bit block counter.
//!
//! State matrix layout:
//! ```text
//! words  0..4   "expand 32-byte k"   (little-endian)
//! words  4..12  key
//! words 12..14  block counter        (low, high)
//! words 14..16  "mistrake"           (fixed in place of a nonce)
//! ```

use zeroize::Zeroize;

use crate::encode::{words_from_le_bytes, words_to_le_bytes};
use crate::sha256::Digest;
use crate::stream::BlockCounter;
use crate::{BLOCK_SIZE, KEY_SIZE};

/// Number of 32-bit words in the state matrix
pub const STATE_WORDS: usize = 16;

/// Column/diagonal iterations; each is two rounds, 20 in total.
const DOUBLE_ROUNDS: usize = 10;

const SIGMA: &[u8; 16] = b"expand 32-byte k";

/// Fixed 8-byte constant occupying the nonce words.
pub const FIXED_NONCE: &[u8; 8] = b"mistrake";

/// A 256-bit ChaCha20 key held as eight words. Zeroized on drop.
#[derive(Clone)]
pub struct CipherKey {
    words: [u32; 8],
}

impl CipherKey {
    pub fn from_words(words: [u32; 8]) -> Self {
        Self { words }
    }

    /// Key words taken straight from a digest's state words.
    pub fn from_digest(digest: &Digest) -> Self {
        Self::from_words(*digest.words())
    }

    /// Key bytes as laid out in RFC 8439 (little-endian words).
    pub fn from_le_bytes(bytes: &[u8; KEY_SIZE]) -> Self {
        Self::from_words(words_from_le_bytes(bytes))
    }

    pub fn words(&self) -> &[u32; 8] {
        &self.words
    }
}

impl Drop for CipherKey {
    fn drop(&mut self) {
        self.words.zeroize();
    }
}

impl std::fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CipherKey")
            .field("words", &"[REDACTED]")
            .finish()
    }
}

/// The add-rotate-XOR mixing step on four words of `state`.
#[inline(always)]
pub fn quarter_round(state: &mut [u32; STATE_WORDS], a: usize, b: usize, c: usize, d: usize) {
    state[a] = state[a].wrapping_add(state[b]);
    state[d] = (state[d] ^ state[a]).rotate_left(16);

    state[c] = state[c].wrapping_add(state[d]);
    state[b] = (state[b] ^ state[c]).rotate_left(12);

    state[a] = state[a].wrapping_add(state[b]);
    state[d] = (state[d] ^ state[a]).rotate_left(8);

    state[c] = state[c].wrapping_add(state[d]);
    state[b] = (state[b] ^ state[c]).rotate_left(7);
}

#[inline(always)]
fn double_round(state: &mut [u32; STATE_WORDS]) {
    // column rounds
    quarter_round(state, 0, 4, 8, 12);
    quarter_round(state, 1, 5, 9, 13);
    quarter_round(state, 2, 6, 10, 14);
    quarter_round(state, 3, 7, 11, 15);

    // diagonal rounds
    quarter_round(state, 0, 5, 10, 15);
    quarter_round(state, 1, 6, 11, 12);
    quarter_round(state, 2, 7, 8, 13);
    quarter_round(state, 3, 4, 9, 14);
}

/// Run the 20 rounds over a copy of `input` and add `input` back in.
pub fn permute(input: &[u32; STATE_WORDS]) -> [u32; STATE_WORDS] {
    let mut working = *input;
    for _ in 0..DOUBLE_ROUNDS {
        double_round(&mut working);
    }
    for (w, s) in working.iter_mut().zip(input.iter()) {
        *w = w.wrapping_add(*s);
    }
    working
}

/// The 16-word input matrix for one key. Only the counter words change
/// between blocks.
#[derive(Clone)]
pub struct StateMatrix {
    words: [u32; STATE_WORDS],
}

impl StateMatrix {
    pub fn new(key: &CipherKey) -> Self {
        Self::with_nonce(key, words_from_le_bytes(FIXED_NONCE))
    }

    /// Build with explicit words 14..16 instead of the fixed constant.
    pub fn with_nonce(key: &CipherKey, nonce: [u32; 2]) -> Self {
        let mut words = [0u32; STATE_WORDS];
        let sigma: [u32; 4] = words_from_le_bytes(SIGMA);
        words[..4].copy_from_slice(&sigma);
        words[4..12].copy_from_slice(key.words());
        words[14..].copy_from_slice(&nonce);
        Self { words }
    }

    pub fn words(&self) -> &[u32; STATE_WORDS] {
        &self.words
    }

    /// Keystream block for `counter`: 64 bytes, little-endian word order.
    pub fn keystream_block(&mut self, counter: BlockCounter) -> [u8; BLOCK_SIZE] {
        let (low, high) = counter.halves();
        self.words[12] = low;
        self.words[13] = high;

        let mut out = permute(&self.words);
        let bytes = words_to_le_bytes(&out);
        out.zeroize();
        bytes
    }
}

impl Drop for StateMatrix {
    fn drop(&mut self) {
        self.words.zeroize();
    }
}

impl std::fmt::Debug for StateMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateMatrix")
            .field("counter", &(self.words[12], self.words[13]))
            .finish_non_exhaustive()
    }
}
