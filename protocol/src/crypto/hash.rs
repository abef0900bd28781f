//! # Checksums
//!
//! SHA-256 is the only binary hash this crate needs: clients send the hex
//! digest of the file they upload, and we recompute it over the decoded
//! bytes before anything leaves the process. Ternary hashing for the Tangle
//! lives in [`super::kerl`] and [`super::curl`].

use sha2::{Digest, Sha256};

/// Compute the SHA-256 digest of `data` as a fixed-size array.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Compute the SHA-256 digest of `data` as lowercase hex.
///
/// Lowercase matches what browsers (`crypto.subtle`) and `sha256sum` emit,
/// which is what clients compare against.
///
/// # Example
///
/// ```
/// use tangle_store::crypto::sha256_hex;
///
/// assert_eq!(
///     sha256_hex(b"hello"),
///     "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
/// );
/// ```
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Check `data` against a client-supplied hex digest.
///
/// The comparison is exact, so an uppercase digest does not match.
/// Returns the computed digest on mismatch so the caller can report both.
pub fn verify_sha256_hex(data: &[u8], expected: &str) -> Result<(), String> {
    let actual = sha256_hex(data);
    if actual == expected {
        Ok(())
    } else {
        Err(actual)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        // SHA-256 of the empty string.
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn sha256_deterministic() {
        let a = sha256(b"tangle");
        let b = sha256(b"tangle");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn test_hex_matches_array() {
        let data = b"consistency check";
        assert_eq!(sha256_hex(data), hex::encode(sha256(data)));
    }

    #[test]
    fn verify_accepts_exact_digest() {
        let digest = sha256_hex(b"hello");
        assert!(verify_sha256_hex(b"hello", &digest).is_ok());
    }

    #[test]
    fn verify_is_case_sensitive() {
        let upper = sha256_hex(b"hello").to_uppercase();
        let err = verify_sha256_hex(b"hello", &upper).unwrap_err();
        assert_eq!(err, sha256_hex(b"hello"));
    }

    #[test]
    fn verify_reports_computed_digest() {
        let err = verify_sha256_hex(b"hello", "deadbeef").unwrap_err();
        assert_eq!(
            err,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }
}
