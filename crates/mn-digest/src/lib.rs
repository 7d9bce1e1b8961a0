use sha2::{Digest, Sha256};

/// Width of every digest in the system: 64 lowercase hex characters
/// (a SHA-256 digest rendered as hex).
pub const HASH_LEN: usize = 64;

/// Compute the digest of `input`.
///
/// Deterministic; always exactly [`HASH_LEN`] lowercase hex characters.
/// Callers rely on nothing beyond "same input, same output" and practical
/// collision freedom.
pub fn digest(input: &[u8]) -> String {
    hex::encode(Sha256::digest(input))
}

/// The all-zero sentinel digest.
///
/// Used as the previous-hash of a genesis block and as the Merkle root of a
/// block with no events.
pub fn zero_digest() -> String {
    "0".repeat(HASH_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_deterministic() {
        assert_eq!(digest(b"hello"), digest(b"hello"));
    }

    #[test]
    fn digest_has_fixed_width() {
        assert_eq!(digest(b"").len(), HASH_LEN);
        assert_eq!(digest(b"some longer input with more bytes").len(), HASH_LEN);
    }

    #[test]
    fn digest_is_lowercase_hex() {
        assert!(digest(b"abc")
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn different_inputs_produce_different_digests() {
        assert_ne!(digest(b"a"), digest(b"b"));
    }

    #[test]
    fn zero_digest_is_all_zeros() {
        let zero = zero_digest();
        assert_eq!(zero.len(), HASH_LEN);
        assert!(zero.chars().all(|c| c == '0'));
    }
}
