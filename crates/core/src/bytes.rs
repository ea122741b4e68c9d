//! Byte keys and the ordering contract
//!
//! All keys in the engine are arbitrary byte sequences ordered by unsigned
//! lexicographic comparison. Rust's `Ord` on `[u8]` already compares bytes
//! as unsigned values, so slice ordering *is* the authoritative comparator
//! for scans, range boundaries, and region membership.
//!
//! `ByteKey` is the owned key type for the unordered auxiliary stores
//! (sequences, fencing counters, lock owners). It wraps a `Vec<u8>` so that
//! equality and hashing are by content, never by identity or address.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalize an optional key to a byte slice, mapping absent to empty.
///
/// Read-path helpers accept `None` to mean "from the first key"; the
/// underlying containers only ever see real (possibly empty) slices.
pub fn nil_to_empty(key: Option<&[u8]>) -> &[u8] {
    key.unwrap_or(&[])
}

/// Owned byte-sequence key with content equality and hashing
///
/// Used as the key type of the sequence, fencing, and lock stores.
/// Ordering is unsigned lexicographic, matching slice ordering.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ByteKey(Vec<u8>);

impl ByteKey {
    /// Wrap a byte sequence as a key.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        ByteKey(bytes.into())
    }

    /// View the key as a byte slice.
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Key length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the key is the empty sequence.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Unwrap into the underlying bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl From<&[u8]> for ByteKey {
    fn from(bytes: &[u8]) -> Self {
        ByteKey(bytes.to_vec())
    }
}

impl From<Vec<u8>> for ByteKey {
    fn from(bytes: Vec<u8>) -> Self {
        ByteKey(bytes)
    }
}

impl AsRef<[u8]> for ByteKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for ByteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Render printable ASCII directly, escape the rest.
        write!(f, "ByteKey(\"")?;
        for &b in &self.0 {
            if (0x20..0x7f).contains(&b) {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:02x}")?;
            }
        }
        write!(f, "\")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    #[test]
    fn test_nil_to_empty() {
        assert_eq!(nil_to_empty(None), b"");
        assert_eq!(nil_to_empty(Some(b"abc")), b"abc");
        assert_eq!(nil_to_empty(Some(b"")), b"");
    }

    #[test]
    fn test_content_equality() {
        let a = ByteKey::new(b"key".to_vec());
        let b = ByteKey::from(&b"key"[..]);
        assert_eq!(a, b);

        let mut hasher_a = DefaultHasher::new();
        a.hash(&mut hasher_a);
        let mut hasher_b = DefaultHasher::new();
        b.hash(&mut hasher_b);
        assert_eq!(hasher_a.finish(), hasher_b.finish());
    }

    #[test]
    fn test_ordering_is_unsigned() {
        // 0x80 must sort after 0x7f: bytes compare as unsigned values.
        assert!(ByteKey::new(vec![0x80]) > ByteKey::new(vec![0x7f]));
        assert!(ByteKey::new(vec![0xff]) > ByteKey::new(vec![0x00]));
        // Prefixes sort before their extensions.
        assert!(ByteKey::new(b"a".to_vec()) < ByteKey::new(b"aa".to_vec()));
        // The empty key sorts first.
        assert!(ByteKey::default() < ByteKey::new(vec![0x00]));
    }

    #[test]
    fn test_debug_rendering() {
        let key = ByteKey::new(b"k\x01".to_vec());
        assert_eq!(format!("{key:?}"), "ByteKey(\"k\\x01\")");
    }
}
