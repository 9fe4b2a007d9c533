//! ChaCha20 stream cipher driver.
//!
//! Block `n` of the stream is XORed with the keystream block for counter
//! `n`. Encryption and decryption are the same operation.

use tracing::trace;
use zeroize::Zeroize;

use crate::chacha20::{CipherKey, StateMatrix};
use crate::BLOCK_SIZE;

/// 64-bit block index stored as two 32-bit halves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct BlockCounter {
    high: u32,
    low: u32,
}

impl BlockCounter {
    pub fn from_halves(low: u32, high: u32) -> Self {
        Self { high, low }
    }

    pub fn from_u64(value: u64) -> Self {
        Self {
            high: (value >> 32) as u32,
            low: value as u32,
        }
    }

    pub fn as_u64(&self) -> u64 {
        (u64::from(self.high) << 32) | u64::from(self.low)
    }

    /// `(low, high)`, the order they occupy in the state matrix.
    pub fn halves(&self) -> (u32, u32) {
        (self.low, self.high)
    }

    /// Advance by one block. Overflow of the low half carries into the high
    /// half; wrapping past 2^64 blocks is not checked.
    pub fn increment(&mut self) {
        let (low, carried) = self.low.overflowing_add(1);
        self.low = low;
        if carried {
            self.high = self.high.wrapping_add(1);
            trace!(high = self.high, "block counter carried into high half");
        }
    }
}

/// Keystream applicator for one key.
///
/// Holds at most one 64-byte keystream block of leftover, so slices of any
/// size can be fed in and the result matches a single call over the whole
/// stream.
pub struct ChaCha20Stream {
    matrix: StateMatrix,
    counter: BlockCounter,
    keystream: [u8; BLOCK_SIZE],
    /// Bytes of `keystream` already consumed; `BLOCK_SIZE` means none left.
    offset: usize,
}

impl ChaCha20Stream {
    pub fn new(key: &CipherKey) -> Self {
        Self::starting_at(key, BlockCounter::default())
    }

    /// Start at an arbitrary block index.
    pub fn starting_at(key: &CipherKey, counter: BlockCounter) -> Self {
        Self {
            matrix: StateMatrix::new(key),
            counter,
            keystream: [0u8; BLOCK_SIZE],
            offset: BLOCK_SIZE,
        }
    }

    /// Counter of the next keystream block to be generated.
    pub fn counter(&self) -> BlockCounter {
        self.counter
    }

    /// XOR the keystream into `data` in place.
    pub fn apply_keystream(&mut self, data: &mut [u8]) {
        let mut pos = 0;
        while pos < data.len() {
            if self.offset == BLOCK_SIZE {
                self.refill();
            }
            let n = (BLOCK_SIZE - self.offset).min(data.len() - pos);
            for (byte, ks) in data[pos..pos + n]
                .iter_mut()
                .zip(&self.keystream[self.offset..self.offset + n])
            {
                *byte ^= ks;
            }
            self.offset += n;
            pos += n;
        }
    }

    fn refill(&mut self) {
        self.keystream = self.matrix.keystream_block(self.counter);
        self.counter.increment();
        self.offset = 0;
    }
}

impl Drop for ChaCha20Stream {
    fn drop(&mut self) {
        self.keystream.zeroize();
    }
}

impl std::fmt::Debug for ChaCha20Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChaCha20Stream")
            .field("counter", &self.counter.as_u64())
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chacha20::{permute, FIXED_NONCE};
    use crate::encode::{words_from_le_bytes, words_to_le_bytes};
    use proptest::prelude::*;

    fn test_key() -> CipherKey {
        CipherKey::from_words([
            0x01234567, 0x89abcdef, 0xfedcba98, 0x76543210, 0x0f1e2d3c, 0x4b5a6978, 0x8796a5b4,
            0xc3d2e1f0,
        ])
    }

    /// Straightforward keystream with a native u64 counter, built directly
    /// on the permutation.
    fn reference_keystream(key: &CipherKey, first_block: u64, len: usize) -> Vec<u8> {
        let nonce: [u32; 2] = words_from_le_bytes(FIXED_NONCE);
        let mut out = Vec::with_capacity(len);
        let mut block = first_block;
        while out.len() < len {
            let mut input = [0u32; 16];
            input[..4].copy_from_slice(&[0x61707865, 0x3320646e, 0x79622d32, 0x6b206574]);
            input[4..12].copy_from_slice(key.words());
            input[12] = block as u32;
            input[13] = (block >> 32) as u32;
            input[14..].copy_from_slice(&nonce);
            let bytes: [u8; 64] = words_to_le_bytes(&permute(&input));
            let take = (len - out.len()).min(64);
            out.extend_from_slice(&bytes[..take]);
            block += 1;
        }
        out
    }

    #[test]
    fn counter_increment_carries() {
        let mut c = BlockCounter::from_halves(0xFFFF_FFFE, 0);
        c.increment();
        assert_eq!(c.halves(), (0xFFFF_FFFF, 0));
        c.increment();
        assert_eq!(c.halves(), (0, 1));
        assert_eq!(c.as_u64(), 1 << 32);
    }

    #[test]
    fn counter_u64_roundtrip() {
        let c = BlockCounter::from_u64(0x0000_0005_8000_0001);
        assert_eq!(c.halves(), (0x8000_0001, 5));
        assert_eq!(c.as_u64(), 0x0000_0005_8000_0001);
    }

    #[test]
    fn counter_wraps_past_u64() {
        let mut c = BlockCounter::from_u64(u64::MAX);
        c.increment();
        assert_eq!(c.as_u64(), 0);
    }

    #[test]
    fn one_block_per_64_bytes() {
        let key = test_key();
        let mut stream = ChaCha20Stream::new(&key);

        let mut data = vec![0u8; 64 * 3 + 5];
        stream.apply_keystream(&mut data);

        assert_eq!(stream.counter().as_u64(), 4);
        assert_eq!(data, reference_keystream(&key, 0, data.len()));
    }

    #[test]
    fn empty_input_generates_no_block() {
        let key = test_key();
        let mut stream = ChaCha20Stream::new(&key);
        stream.apply_keystream(&mut []);
        assert_eq!(stream.counter().as_u64(), 0);
    }

    #[test]
    fn carry_boundary_matches_u64_reference() {
        let key = test_key();
        let start = 0xFFFF_FFFDu64;
        let mut stream = ChaCha20Stream::starting_at(&key, BlockCounter::from_u64(start));

        // six blocks: counters ffff_fffd ..= 1_0000_0002
        let mut data = vec![0u8; 6 * 64];
        stream.apply_keystream(&mut data);

        assert_eq!(data, reference_keystream(&key, start, data.len()));
        assert_eq!(stream.counter().halves(), (3, 1));
    }

    #[test]
    fn encrypt_twice_is_identity() {
        let key = test_key();
        let plaintext: Vec<u8> = (0..1000u32).map(|i| (i * 31 % 251) as u8).collect();

        let mut data = plaintext.clone();
        ChaCha20Stream::new(&key).apply_keystream(&mut data);
        assert_ne!(data, plaintext);
        ChaCha20Stream::new(&key).apply_keystream(&mut data);
        assert_eq!(data, plaintext);
    }

    proptest! {
        #[test]
        fn split_calls_match_single_call(
            data in proptest::collection::vec(any::<u8>(), 0..=700),
            splits in proptest::collection::vec(1usize..=130, 1..=16),
        ) {
            let key = test_key();

            let mut whole = data.clone();
            ChaCha20Stream::new(&key).apply_keystream(&mut whole);

            let mut pieces = data.clone();
            let mut stream = ChaCha20Stream::new(&key);
            let mut pos = 0;
            for step in splits.iter().cycle() {
                if pos == pieces.len() {
                    break;
                }
                let end = (pos + step).min(pieces.len());
                stream.apply_keystream(&mut pieces[pos..end]);
                pos = end;
            }

            prop_assert_eq!(pieces, whole);
        }
    }
}
