//! Content-addressed hash type using BLAKE3

use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Width of a digest in bytes
pub const HASH_LEN: usize = 32;

/// Width of a rendered fingerprint in hex characters
pub const HEX_LEN: usize = HASH_LEN * 2;

/// Number of hex characters used for the shard directory name
pub const SHARD_LEN: usize = 2;

/// A 32-byte BLAKE3 hash used for content addressing
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hash([u8; HASH_LEN]);

impl Hash {
    /// The zero hash. Well-formed, but no frame is expected to digest to it.
    pub const ZERO: Hash = Hash([0u8; HASH_LEN]);

    /// Hash arbitrary data
    pub fn digest(data: &[u8]) -> Self {
        let hash = blake3::hash(data);
        Hash(*hash.as_bytes())
    }

    /// Hash multiple pieces of data as if they were concatenated
    pub fn digest_many(parts: &[&[u8]]) -> Self {
        let mut hasher = blake3::Hasher::new();
        for part in parts {
            hasher.update(part);
        }
        Hash(*hasher.finalize().as_bytes())
    }

    /// Convert to a full-width lowercase hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string
    ///
    /// Exactly [`HEX_LEN`] hex digits are accepted; upper case input is
    /// tolerated but the canonical rendering is always lower case.
    pub fn from_hex(s: &str) -> Result<Self> {
        if s.len() != HEX_LEN {
            return Err(Error::InvalidHash(format!(
                "expected {} hex characters, got {}",
                HEX_LEN,
                s.len()
            )));
        }
        let mut arr = [0u8; HASH_LEN];
        hex::decode_to_slice(s, &mut arr).map_err(|e| Error::InvalidHash(format!("{s}: {e}")))?;
        Ok(Hash(arr))
    }

    /// Split the hex form into `(shard directory, file name)`
    pub fn split_hex(&self) -> (String, String) {
        let mut hex = self.to_hex();
        let rest = hex.split_off(SHARD_LEN);
        (hex, rest)
    }

    /// Get a short prefix for display (first 7 chars, like git)
    pub fn short(&self) -> String {
        self.to_hex()[..7].to_string()
    }

    /// Check if this is the zero hash
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; HASH_LEN]
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.short())
    }
}

impl FromStr for Hash {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Hash::from_hex(s)
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_digest() {
        let h1 = Hash::digest(b"hello");
        let h2 = Hash::digest(b"hello");
        let h3 = Hash::digest(b"world");

        assert_eq!(h1, h2);
        assert_ne!(h1, h3);
    }

    #[test]
    fn test_digest_empty_input() {
        // Known BLAKE3 digest of the empty string
        assert_eq!(
            Hash::digest(b"").to_hex(),
            "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262"
        );
    }

    #[test]
    fn test_digest_many_matches_concatenation() {
        let joined = Hash::digest(b"blob 5\0hello");
        let parts = Hash::digest_many(&[b"blob 5", b"\0", b"hello"]);
        assert_eq!(joined, parts);
    }

    #[test]
    fn test_hash_hex_roundtrip() {
        let h1 = Hash::digest(b"test data");
        let hex = h1.to_hex();
        assert_eq!(hex.len(), HEX_LEN);
        assert!(hex.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
        let h2 = Hash::from_hex(&hex).unwrap();
        assert_eq!(h1, h2);
    }

    #[test]
    fn test_zero_renders_full_width() {
        assert_eq!(Hash::ZERO.to_hex(), "0".repeat(HEX_LEN));
        assert!(Hash::ZERO.is_zero());
    }

    #[test]
    fn test_from_hex_rejects_bad_input() {
        assert!(matches!(Hash::from_hex("abc"), Err(Error::InvalidHash(_))));
        let not_hex = "z".repeat(HEX_LEN);
        assert!(matches!(Hash::from_hex(&not_hex), Err(Error::InvalidHash(_))));
    }

    #[test]
    fn test_from_hex_accepts_upper_case() {
        let h = Hash::digest(b"case");
        let upper = h.to_hex().to_uppercase();
        assert_eq!(upper.parse::<Hash>().unwrap(), h);
    }

    #[test]
    fn test_split_hex() {
        let h = Hash::digest(b"shard me");
        let (shard, rest) = h.split_hex();
        assert_eq!(shard.len(), SHARD_LEN);
        assert_eq!(rest.len(), HEX_LEN - SHARD_LEN);
        assert_eq!(format!("{shard}{rest}"), h.to_hex());
    }

    #[test]
    fn test_hash_short() {
        let h = Hash::digest(b"test");
        assert_eq!(h.short().len(), 7);
    }

    #[test]
    fn test_serde_as_hex_string() {
        let h = Hash::digest(b"json");
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(json, format!("\"{}\"", h.to_hex()));
        let back: Hash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, h);
    }
}
