//! Cryptographic hash functions

use sha2::Digest;

/// SHA-256 hash
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = sha2::Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// SHA-384 hash
pub fn sha384(data: &[u8]) -> [u8; 48] {
    let mut hasher = sha2::Sha384::new();
    hasher.update(data);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_empty() {
        assert_eq!(
            sha256(&[]),
            [
                227, 176, 196, 66, 152, 252, 28, 20, 154, 251, 244, 200, 153, 111, 185, 36, 39,
                174, 65, 228, 100, 155, 147, 76, 164, 149, 153, 27, 120, 82, 184, 85
            ]
        );
    }

    #[test]
    fn sha384_len() {
        assert_eq!(sha384(b"abc").len(), 48);
        assert_ne!(sha384(b"abc"), sha384(b"abd"));
    }
}
