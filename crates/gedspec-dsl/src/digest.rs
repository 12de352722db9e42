//! Source-document digests.
//!
//! A run report needs a stable way to say exactly which document text it was
//! produced from, so downstream consumers can tell whether two reports refer
//! to the same input.
//!
//! We use a simple, deterministic, non-cryptographic digest:
//!
//! - algorithm: FNV-1a 64-bit
//! - input: the UTF-8 bytes of the document as-read
//! - output: `"fnv1a64:<16 lowercase hex digits>"`
//!
//! This is an identity tool, not a security primitive.

/// Prefix used in serialized digests.
pub const SOURCE_DIGEST_PREFIX: &str = "fnv1a64:";

/// Compute the digest of a source document's text.
pub fn source_digest(text: &str) -> String {
    const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x00000100000001b3;

    let mut hash = FNV_OFFSET_BASIS;
    for b in text.as_bytes() {
        hash ^= (*b) as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }

    format!("{SOURCE_DIGEST_PREFIX}{hash:016x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_has_expected_prefix_and_width() {
        let d = source_digest("# sample document\n");
        assert!(d.starts_with(SOURCE_DIGEST_PREFIX));
        assert_eq!(d.len(), SOURCE_DIGEST_PREFIX.len() + 16);
    }

    #[test]
    fn digest_changes_when_text_changes() {
        assert_ne!(source_digest("a"), source_digest("b"));
    }

    #[test]
    fn digest_is_stable() {
        assert_eq!(source_digest("same"), source_digest("same"));
    }
}
