//! Record identifiers: UUIDv7 generation and the URN round-trip.
//!
//! Generation is delegated to the `uuid` crate; parsing validates the
//! hyphenated 8-4-4-4-12 rendering strictly so that malformed input is
//! reported with the failing character.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{QuillError, QuillResult};

const URN_LEN: usize = 36;
const HYPHENS: [usize; 4] = [8, 13, 18, 23];

/// A 16-byte version-7 identifier: 48-bit big-endian Unix-milliseconds
/// timestamp, version nibble 7, variant bits `10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Uuid7(Uuid);

impl Uuid7 {
    /// Generate a fresh identifier from the current wall clock.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.as_bytes().to_vec()
    }

    /// Milliseconds since the Unix epoch, from the leading 48 bits.
    pub fn timestamp_ms(&self) -> u64 {
        let b = self.0.as_bytes();
        ((b[0] as u64) << 40)
            | ((b[1] as u64) << 32)
            | ((b[2] as u64) << 24)
            | ((b[3] as u64) << 16)
            | ((b[4] as u64) << 8)
            | (b[5] as u64)
    }

    /// The hyphenated lowercase hex rendering.
    pub fn to_urn(&self) -> String {
        self.0.hyphenated().to_string()
    }

    /// Parse a hyphenated rendering, case-insensitively.
    pub fn from_urn(urn: &str) -> QuillResult<Self> {
        if urn.len() != URN_LEN || !urn.is_ascii() {
            return Err(QuillError::MalformedUrnString(urn.to_owned()));
        }
        for (position, character) in urn.char_indices() {
            if HYPHENS.contains(&position) {
                if character != '-' {
                    return Err(QuillError::MalformedUrnString(urn.to_owned()));
                }
            } else if !character.is_ascii_hexdigit() {
                return Err(QuillError::InvalidHexCharacter {
                    character,
                    position,
                });
            }
        }
        let parsed = Uuid::try_parse(urn)
            .map_err(|_| QuillError::MalformedUrnString(urn.to_owned()))?;
        Ok(Self(parsed))
    }
}

impl Default for Uuid7 {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Uuid7 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_urn())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn test_urn_round_trip() {
        let id = Uuid7::new();
        let urn = id.to_urn();
        assert_eq!(urn.len(), 36);
        assert_eq!(Uuid7::from_urn(&urn).unwrap(), id);
    }

    #[test]
    fn test_version_and_variant_bits() {
        let id = Uuid7::new();
        let b = id.as_bytes();
        assert_eq!(b[6] >> 4, 7);
        assert_eq!(b[8] >> 6, 0b10);
    }

    #[test]
    fn test_timestamp_near_now() {
        let id = Uuid7::new();
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64;
        let ts = id.timestamp_ms();
        assert!(now.abs_diff(ts) < 1_000, "timestamp {ts} too far from {now}");
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        let urn = "6ba7b811-9dad-11d1-80b4-00c04fd430c8";
        let id = Uuid7::from_urn(urn).unwrap();
        assert_eq!(id.to_urn(), urn);
        let upper = Uuid7::from_urn(&urn.to_uppercase()).unwrap();
        assert_eq!(upper, id);
    }

    #[test]
    fn test_malformed_urn() {
        for bad in ["", "6ba7b811", "6ba7b811-9dad-11d1-80b4-00c04fd430c8ff"] {
            assert!(matches!(
                Uuid7::from_urn(bad).unwrap_err(),
                QuillError::MalformedUrnString(_)
            ));
        }
        // Hyphen out of place.
        assert!(matches!(
            Uuid7::from_urn("6ba7b8119-dad-11d1-80b4-00c04fd430c8").unwrap_err(),
            QuillError::MalformedUrnString(_)
        ));
    }

    #[test]
    fn test_invalid_hex_character() {
        let err = Uuid7::from_urn("6ba7b811-9dad-11d1-80b4-00c04fd430cz").unwrap_err();
        match err {
            QuillError::InvalidHexCharacter { character, position } => {
                assert_eq!(character, 'z');
                assert_eq!(position, 35);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_fresh_ids_are_distinct_and_ordered() {
        let a = Uuid7::new();
        let b = Uuid7::new();
        assert_ne!(a, b);
        assert!(a.timestamp_ms() <= b.timestamp_ms());
    }
}
