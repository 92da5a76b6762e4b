//! Scope-id hashing.

use std::hash::{Hash, Hasher};

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz234567";

/// Hash a string to an 8-character lowercase alphanumeric scope id.
pub fn hash_string(input: &str) -> String {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    input.hash(&mut hasher);
    to_base32_like(hasher.finish())
}

/// Convert a u64 hash to a lowercase alphanumeric string (similar to base32).
fn to_base32_like(hash: u64) -> String {
    let mut result = String::with_capacity(8);
    let mut h = hash;
    for _ in 0..8 {
        let idx = (h & 0x1f) as usize;
        result.push(ALPHABET[idx] as char);
        h >>= 5;
    }
    result
}
