/// Computes a 64-bit hash of the input data using BLAKE3, truncated from 256 bits.
#[inline]
pub fn hash_to_u64(data: &[u8]) -> u64 {
    truncate(blake3::hash(data))
}

/// Short content fingerprint, logged per uploaded document.
#[inline]
pub fn hash_text(text: &str) -> u64 {
    hash_to_u64(text.as_bytes())
}

fn truncate(hash: blake3::Hash) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}
