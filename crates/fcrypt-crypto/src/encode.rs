//! Endian-aware packing between byte arrays and 32-bit words.
//!
//! SHA-256 reads and writes words big-endian; ChaCha20 is little-endian
//! throughout. The arithmetic modules never index bytes themselves.

#[inline]
pub fn load_u32_be(bytes: &[u8; 4]) -> u32 {
    u32::from_be_bytes(*bytes)
}

#[inline]
pub fn load_u32_le(bytes: &[u8; 4]) -> u32 {
    u32::from_le_bytes(*bytes)
}

#[inline]
pub fn store_u32_be(word: u32) -> [u8; 4] {
    word.to_be_bytes()
}

#[inline]
pub fn store_u32_le(word: u32) -> [u8; 4] {
    word.to_le_bytes()
}

#[inline]
fn quad(bytes: &[u8], i: usize) -> [u8; 4] {
    [bytes[4 * i], bytes[4 * i + 1], bytes[4 * i + 2], bytes[4 * i + 3]]
}

/// Decode `N` big-endian words from `4 * N` bytes.
pub fn words_from_be_bytes<const N: usize, const B: usize>(bytes: &[u8; B]) -> [u32; N] {
    debug_assert_eq!(B, 4 * N);
    std::array::from_fn(|i| load_u32_be(&quad(bytes, i)))
}

/// Decode `N` little-endian words from `4 * N` bytes.
pub fn words_from_le_bytes<const N: usize, const B: usize>(bytes: &[u8; B]) -> [u32; N] {
    debug_assert_eq!(B, 4 * N);
    std::array::from_fn(|i| load_u32_le(&quad(bytes, i)))
}

/// Encode words big-endian into `4 * N` bytes.
pub fn words_to_be_bytes<const N: usize, const B: usize>(words: &[u32; N]) -> [u8; B] {
    debug_assert_eq!(B, 4 * N);
    std::array::from_fn(|i| store_u32_be(words[i / 4])[i % 4])
}

/// Encode words little-endian into `4 * N` bytes. Byte 0 is the low byte of word 0.
pub fn words_to_le_bytes<const N: usize, const B: usize>(words: &[u32; N]) -> [u8; B] {
    debug_assert_eq!(B, 4 * N);
    std::array::from_fn(|i| store_u32_le(words[i / 4])[i % 4])
}
