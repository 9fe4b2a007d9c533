//! Padding and length framing for SHA-256.
//!
//! Input is regrouped into 64-byte chunks. Full chunks are compressed as
//! they arrive; the final short chunk (possibly empty) is padded with a
//! `0x80` marker, zeros, and the 64-bit message bit-length big-endian. A
//! tail of 56..=63 bytes has no room for the length field and spills into
//! a second, otherwise all-zero block.

use crate::encode::store_u32_be;
use crate::sha256::{compress, Digest, INITIAL_STATE};
use crate::BLOCK_SIZE;

/// Offset of the 8-byte length field inside the final block.
const LENGTH_OFFSET: usize = BLOCK_SIZE - 8;

/// Running message length in bits, kept as two 32-bit halves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BitLength {
    high: u32,
    low: u32,
}

impl BitLength {
    pub fn from_parts(high: u32, low: u32) -> Self {
        Self { high, low }
    }

    pub fn high(&self) -> u32 {
        self.high
    }

    pub fn low(&self) -> u32 {
        self.low
    }

    pub fn as_u64(&self) -> u64 {
        (u64::from(self.high) << 32) | u64::from(self.low)
    }

    /// Account for one chunk of `len` bytes (at most one block).
    pub fn add_bytes(&mut self, len: usize) {
        debug_assert!(len <= BLOCK_SIZE);
        // len <= 64, so 8 * len fits comfortably in a u32
        let bits = 8 * len as u32;
        let (low, carried) = self.low.overflowing_add(bits);
        self.low = low;
        if carried {
            self.high = self.high.wrapping_add(1);
        }
    }

    pub fn to_be_bytes(&self) -> [u8; 8] {
        let mut out = [0u8; 8];
        out[..4].copy_from_slice(&store_u32_be(self.high));
        out[4..].copy_from_slice(&store_u32_be(self.low));
        out
    }
}

/// The one or two blocks that close a message.
#[derive(Debug, Clone)]
pub struct PaddedTail {
    blocks: [[u8; BLOCK_SIZE]; 2],
    count: usize,
}

impl PaddedTail {
    pub fn blocks(&self) -> &[[u8; BLOCK_SIZE]] {
        &self.blocks[..self.count]
    }
}

/// Pad the final short chunk. `tail` must be shorter than one block and
/// `bit_len` must already include it.
pub fn pad_tail(tail: &[u8], bit_len: BitLength) -> PaddedTail {
    assert!(tail.len() < BLOCK_SIZE, "tail must be a partial block");

    let mut blocks = [[0u8; BLOCK_SIZE]; 2];
    blocks[0][..tail.len()].copy_from_slice(tail);
    blocks[0][tail.len()] = 0x80;

    let count = if tail.len() < LENGTH_OFFSET { 1 } else { 2 };
    blocks[count - 1][LENGTH_OFFSET..].copy_from_slice(&bit_len.to_be_bytes());

    PaddedTail { blocks, count }
}

/// Streaming SHA-256 hasher.
///
/// `update` may be called with slices of any size; the digest is the same
/// as hashing the concatenation in one call.
#[derive(Clone)]
pub struct Sha256 {
    state: [u32; 8],
    bit_len: BitLength,
    buffer: [u8; BLOCK_SIZE],
    buffered: usize,
}

impl Default for Sha256 {
    fn default() -> Self {
        Self::new()
    }
}

impl Sha256 {
    pub fn new() -> Self {
        Self {
            state: INITIAL_STATE,
            bit_len: BitLength::default(),
            buffer: [0u8; BLOCK_SIZE],
            buffered: 0,
        }
    }

    /// One-shot digest of `data`.
    pub fn digest(data: &[u8]) -> Digest {
        let mut hasher = Self::new();
        hasher.update(data);
        hasher.finalize()
    }

    pub fn update(&mut self, mut data: &[u8]) {
        if self.buffered > 0 {
            let take = (BLOCK_SIZE - self.buffered).min(data.len());
            self.buffer[self.buffered..self.buffered + take].copy_from_slice(&data[..take]);
            self.buffered += take;
            data = &data[take..];

            if self.buffered < BLOCK_SIZE {
                return;
            }
            let block = self.buffer;
            self.absorb(&block);
            self.buffered = 0;
        }

        let mut chunks = data.chunks_exact(BLOCK_SIZE);
        for chunk in &mut chunks {
            let mut block = [0u8; BLOCK_SIZE];
            block.copy_from_slice(chunk);
            self.absorb(&block);
        }

        let rest = chunks.remainder();
        self.buffer[..rest.len()].copy_from_slice(rest);
        self.buffered = rest.len();
    }

    /// Total message length consumed so far.
    pub fn bit_len(&self) -> BitLength {
        let mut len = self.bit_len;
        len.add_bytes(self.buffered);
        len
    }

    pub fn finalize(mut self) -> Digest {
        let tail_len = self.buffered;
        self.bit_len.add_bytes(tail_len);

        let padded = pad_tail(&self.buffer[..tail_len], self.bit_len);
        for block in padded.blocks() {
            compress(&mut self.state, block);
        }
        Digest::from_words(self.state)
    }

    fn absorb(&mut self, block: &[u8; BLOCK_SIZE]) {
        self.bit_len.add_bytes(BLOCK_SIZE);
        compress(&mut self.state, block);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sha2::Digest as _;

    fn hex(data: &[u8]) -> String {
        Sha256::digest(data).to_hex()
    }

    #[test]
    fn empty_input() {
        assert_eq!(
            hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn abc() {
        assert_eq!(
            hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn two_block_448_bit_message() {
        // 56 bytes: the length field spills into a second block
        assert_eq!(
            hex(b"abcdbcdecdefdefgefghfghighijhijkijkljklmklmnlmnomnopnopq"),
            "248d6a61d20638b8e5c026930c3e6039a33ce45964ff2167f6ecedd419db06c1"
        );
    }

    #[test]
    fn multi_block_896_bit_message() {
        assert_eq!(
            hex(b"abcdefghbcdefghicdefghijdefghijkefghijklfghijklmghijklmnhijklmnoijklmnopjklmnopqklmnopqrlmnopqrsmnopqrstnopqrstu"),
            "cf5b16a778af8380036ce59e7b0492370b249b11e8f07a51afac45037afee9d1"
        );
    }

    #[test]
    fn one_million_a() {
        let mut hasher = Sha256::new();
        let chunk = [b'a'; 1000];
        for _ in 0..1000 {
            hasher.update(&chunk);
        }
        assert_eq!(
            hasher.finalize().to_hex(),
            "cdc76e5c9914fb9281a1c7e284d73e67f1809a48a497200e046d39ccc7112cd0"
        );
    }

    #[test]
    fn padding_boundaries_match_reference() {
        for len in [0usize, 1, 55, 56, 57, 63, 64, 65, 119, 120, 127, 128] {
            let data = vec![0xA5u8; len];
            let expected = sha2::Sha256::digest(&data);
            assert_eq!(
                Sha256::digest(&data).to_bytes().as_slice(),
                expected.as_slice(),
                "length {len}"
            );
        }
    }

    #[test]
    fn short_tail_fits_in_one_block() {
        let tail = [0x11u8; 55];
        let mut len = BitLength::default();
        len.add_bytes(tail.len());

        let padded = pad_tail(&tail, len);
        let blocks = padded.blocks();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0][55], 0x80);
        assert_eq!(&blocks[0][56..], &[0, 0, 0, 0, 0, 0, 0x01, 0xb8]);
    }

    #[test]
    fn long_tail_spills_length_into_second_block() {
        let tail = [0x22u8; 56];
        let mut len = BitLength::default();
        len.add_bytes(tail.len());

        let padded = pad_tail(&tail, len);
        let blocks = padded.blocks();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0][56], 0x80);
        assert!(blocks[0][57..].iter().all(|&b| b == 0));
        assert!(blocks[1][..56].iter().all(|&b| b == 0));
        assert_eq!(&blocks[1][56..], &[0, 0, 0, 0, 0, 0, 0x01, 0xc0]);
    }

    #[test]
    fn sixty_three_byte_tail_marker_is_last_byte() {
        let tail = [0x33u8; 63];
        let padded = pad_tail(&tail, BitLength::from_parts(0, 504));
        let blocks = padded.blocks();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0][63], 0x80);
    }

    #[test]
    fn empty_tail_after_full_blocks() {
        let padded = pad_tail(&[], BitLength::from_parts(0, 512));
        let blocks = padded.blocks();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0][0], 0x80);
        assert_eq!(&blocks[0][56..], &[0, 0, 0, 0, 0, 0, 0x02, 0x00]);
    }

    #[test]
    fn bit_length_carries_into_high_half() {
        let mut len = BitLength::from_parts(0, 0xFFFF_FE00);
        len.add_bytes(64);
        assert_eq!(len, BitLength::from_parts(1, 0));

        let mut len = BitLength::from_parts(7, 0xFFFF_FFF8);
        len.add_bytes(3);
        assert_eq!(len.high(), 8);
        assert_eq!(len.low(), 0x10);
        assert_eq!(len.as_u64(), (8u64 << 32) | 0x10);
        assert_eq!(len.to_be_bytes(), [0, 0, 0, 8, 0, 0, 0, 0x10]);
    }

    #[test]
    fn bit_length_tracks_buffered_bytes() {
        let mut hasher = Sha256::new();
        hasher.update(&[0u8; 100]);
        assert_eq!(hasher.bit_len().as_u64(), 800);
    }

    proptest! {
        #[test]
        fn matches_reference_sha256(data in proptest::collection::vec(any::<u8>(), 0..=1024)) {
            let expected = sha2::Sha256::digest(&data);
            let actual = Sha256::digest(&data).to_bytes();
            prop_assert_eq!(actual.as_slice(), expected.as_slice());
        }

        #[test]
        fn chunked_updates_match_one_shot(
            data in proptest::collection::vec(any::<u8>(), 0..=2048),
            splits in proptest::collection::vec(1usize..=200, 1..=32),
        ) {
            let mut hasher = Sha256::new();
            let mut rest = data.as_slice();
            for step in splits.iter().cycle() {
                if rest.is_empty() {
                    break;
                }
                let n = (*step).min(rest.len());
                hasher.update(&rest[..n]);
                rest = &rest[n..];
            }
            prop_assert_eq!(hasher.finalize(), Sha256::digest(&data));
        }
    }
}
