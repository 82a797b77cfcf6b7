// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Key hashing contract shared with the hash-map runtime.
//!
//! The lowering never hashes a key itself: the runtime does, over the exact
//! byte image the lowering stages (the string's bytes for string keys, the
//! key's in-memory layout for binary keys). Both sides must produce the same
//! values bit for bit, so these functions are kept as the reference.

/// FNV-1a 32-bit offset basis.
pub const FNV_OFFSET_BASIS: u32 = 2166136261;
/// FNV-1a 32-bit prime.
pub const FNV_PRIME: u32 = 16777619;

/// Top-hash value the runtime reserves for an empty bucket slot.
pub const EMPTY_TOP_HASH: u8 = 0;

/// FNV-1a over `data`, no finalization.
pub fn content_hash(data: &[u8]) -> u32 {
    data.iter().fold(FNV_OFFSET_BASIS, |hash, &byte| {
        (hash ^ u32::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Top 8 bits of a hash, never equal to `EMPTY_TOP_HASH`.
pub fn top_hash(hash: u32) -> u8 {
    let mut top = (hash >> 24) as u8;
    if top < 1 {
        top += 1;
    }
    top
}

/// Full hash and its bucket tag for one key image.
pub fn key_hash(data: &[u8]) -> (u32, u8) {
    let hash = content_hash(data);
    (hash, top_hash(hash))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_offset_basis() {
        assert_eq!(content_hash(&[]), 2166136261);
        assert_eq!(content_hash(b""), FNV_OFFSET_BASIS);
    }

    #[test]
    fn fixed_vectors() {
        assert_eq!(content_hash(b"a"), 0xe40c_292c);
        assert_eq!(content_hash(b"foobar"), 0xbf9c_f968);
        assert_eq!(content_hash(&[0]), 0x050c_5d1f);
        assert_eq!(content_hash(&[0, 0, 0, 0]), 0x4b95_f515);
        // little-endian i64 key 1
        assert_eq!(content_hash(&1i64.to_le_bytes()), 0x3e80_1244);
    }

    #[test]
    fn deterministic_and_byte_sensitive() {
        let key = b"user:1042";
        assert_eq!(content_hash(key), content_hash(key));
        let mut flipped = *key;
        flipped[5] ^= 1;
        assert_ne!(content_hash(key), content_hash(&flipped));
        assert_ne!(content_hash(b"ab"), content_hash(b"ba"));
    }

    #[test]
    fn top_hash_takes_high_byte() {
        assert_eq!(top_hash(0xe40c_292c), 0xe4);
        assert_eq!(top_hash(0xff00_0000), 0xff);
        assert_eq!(top_hash(0x0100_0000), 1);
    }

    #[test]
    fn top_hash_never_empty() {
        assert_eq!(top_hash(0), 1);
        assert_eq!(top_hash(0x00ff_ffff), 1);
        for h in (0u32..=u32::MAX).step_by(0x0001_0007) {
            let expected = if h >> 24 == 0 { 1 } else { (h >> 24) as u8 };
            assert_eq!(top_hash(h), expected);
            assert_ne!(top_hash(h), EMPTY_TOP_HASH);
        }
    }

    #[test]
    fn key_hash_pairs_hash_and_tag() {
        assert_eq!(key_hash(b"a"), (0xe40c_292c, 0xe4));
        assert_eq!(key_hash(&[0]), (0x050c_5d1f, 5));
    }
}
