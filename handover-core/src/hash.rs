//! Domain-separated SHA-256 hashing and the `DataHash` wire type.
//!
//! Every hash computed by this crate is prefixed with a domain tag so that a
//! hash produced in one role (state, transaction, request id, ...) can never
//! be replayed in another.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{CoreError, Result};

/// Domain tag for token state hashes.
pub const DOMAIN_STATE: &[u8] = b"handover/state/v1";
/// Domain tag for transfer transaction hashes.
pub const DOMAIN_TRANSACTION: &[u8] = b"handover/tx/v1";
/// Domain tag for aggregator request ids.
pub const DOMAIN_REQUEST_ID: &[u8] = b"handover/request/v1";
/// Domain tag for Merkle leaf hashes.
pub const DOMAIN_LEAF: &[u8] = b"handover/leaf/v1";
/// Domain tag for Merkle interior nodes.
pub const DOMAIN_NODE: &[u8] = b"handover/node/v1";
/// Domain tag for ledger certificate signing.
pub const DOMAIN_CERTIFICATE: &[u8] = b"handover/cert/v1";
/// Domain tag for token state data hashing.
pub const DOMAIN_STATE_DATA: &[u8] = b"handover/state-data/v1";
/// Domain tag for the synthetic source state consumed by a mint.
pub const DOMAIN_MINT: &[u8] = b"handover/mint/v1";
/// Domain tag for unmasked predicate references.
pub const DOMAIN_PREDICATE_UNMASKED: &[u8] = b"handover/predicate/unmasked/v1";
/// Domain tag for masked predicate references.
pub const DOMAIN_PREDICATE_MASKED: &[u8] = b"handover/predicate/masked/v1";
/// Domain tag for address derivation from a predicate reference.
pub const DOMAIN_ADDRESS: &[u8] = b"handover/address/v1";
/// Domain tag for signing-key seed derivation.
pub const DOMAIN_KEY_SEED: &[u8] = b"handover/key/v1";
/// Domain tag for hashing free-text inputs down to 32 bytes.
pub const DOMAIN_TEXT_INPUT: &[u8] = b"handover/text/v1";

/// A 32-byte SHA-256 digest, serialized as a `0x`-prefixed hex string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DataHash(pub [u8; 32]);

impl DataHash {
    /// Wrap raw digest bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render as lowercase hex without a prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a hex string, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        if s.len() != 64 {
            return Err(CoreError::InvalidHex(format!(
                "expected 64 hex chars, got {}",
                s.len()
            )));
        }
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|e| CoreError::InvalidHex(e.to_string()))?;
        Ok(Self(bytes))
    }
}

impl std::fmt::Debug for DataHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DataHash(0x{})", self.to_hex())
    }
}

impl std::fmt::Display for DataHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl Serialize for DataHash {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&format!("0x{}", self.to_hex()))
    }
}

impl<'de> Deserialize<'de> for DataHash {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DataHash::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Incremental domain-separated hasher.
///
/// The domain tag is absorbed first, then each field is length-prefixed so
/// that adjacent variable-length fields cannot be re-split into a colliding
/// input.
pub struct DomainHasher {
    inner: Sha256,
}

impl DomainHasher {
    /// Start a new hash under the given domain tag.
    pub fn new(domain: &[u8]) -> Self {
        let mut inner = Sha256::new();
        inner.update((domain.len() as u64).to_be_bytes());
        inner.update(domain);
        Self { inner }
    }

    /// Absorb a length-prefixed field.
    pub fn update(mut self, field: &[u8]) -> Self {
        self.inner.update((field.len() as u64).to_be_bytes());
        self.inner.update(field);
        self
    }

    /// Absorb an optional field, distinguishing absence from emptiness.
    pub fn update_opt(mut self, field: Option<&[u8]>) -> Self {
        match field {
            Some(bytes) => {
                self.inner.update([1u8]);
                self.inner.update((bytes.len() as u64).to_be_bytes());
                self.inner.update(bytes);
            }
            None => self.inner.update([0u8]),
        }
        self
    }

    /// Finish and return the digest.
    pub fn finalize(self) -> DataHash {
        DataHash(self.inner.finalize().into())
    }
}

/// Hash arbitrary free-text input down to 32 bytes.
///
/// Used when the caller supplies a textual nonce or token type instead of
/// raw hex bytes (resolved once at the input boundary, never re-sniffed).
pub fn hash_text_input(text: &str) -> DataHash {
    DomainHasher::new(DOMAIN_TEXT_INPUT)
        .update(text.as_bytes())
        .finalize()
}

/// Caller-supplied byte input that is either exact hex bytes or free text.
///
/// Resolved exactly once at the input boundary: a 64-hex-char string decodes
/// to its raw 32 bytes, anything else hashes down to 32 bytes. Downstream
/// code only ever sees the resolved [`DataHash`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ByteInput {
    /// Exact 32 bytes supplied as hex.
    HexBytes([u8; 32]),
    /// Free text to be hashed down to 32 bytes.
    TextToHash(String),
}

impl ByteInput {
    /// Classify a raw input string.
    pub fn parse(input: &str) -> Self {
        if input.len() == 64 {
            let mut bytes = [0u8; 32];
            if hex::decode_to_slice(input, &mut bytes).is_ok() {
                return Self::HexBytes(bytes);
            }
        }
        Self::TextToHash(input.to_string())
    }

    /// Resolve to the 32-byte value used everywhere downstream.
    pub fn resolve(&self) -> DataHash {
        match self {
            Self::HexBytes(bytes) => DataHash(*bytes),
            Self::TextToHash(text) => hash_text_input(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip() {
        let h = DomainHasher::new(DOMAIN_STATE).update(b"abc").finalize();
        let parsed = DataHash::from_hex(&h.to_hex()).unwrap();
        assert_eq!(h, parsed);
        let prefixed = DataHash::from_hex(&format!("0x{}", h.to_hex())).unwrap();
        assert_eq!(h, prefixed);
    }

    #[test]
    fn rejects_short_hex() {
        assert!(DataHash::from_hex("abcd").is_err());
    }

    #[test]
    fn domains_separate() {
        let a = DomainHasher::new(DOMAIN_STATE).update(b"x").finalize();
        let b = DomainHasher::new(DOMAIN_TRANSACTION).update(b"x").finalize();
        assert_ne!(a, b);
    }

    #[test]
    fn length_prefix_prevents_field_splitting() {
        let a = DomainHasher::new(DOMAIN_STATE)
            .update(b"ab")
            .update(b"c")
            .finalize();
        let b = DomainHasher::new(DOMAIN_STATE)
            .update(b"a")
            .update(b"bc")
            .finalize();
        assert_ne!(a, b);
    }

    #[test]
    fn absent_differs_from_empty() {
        let absent = DomainHasher::new(DOMAIN_TRANSACTION)
            .update_opt(None)
            .finalize();
        let empty = DomainHasher::new(DOMAIN_TRANSACTION)
            .update_opt(Some(b""))
            .finalize();
        assert_ne!(absent, empty);
    }

    #[test]
    fn serde_round_trip() {
        let h = hash_text_input("fungible");
        let json = serde_json::to_string(&h).unwrap();
        assert!(json.starts_with("\"0x"));
        let back: DataHash = serde_json::from_str(&json).unwrap();
        assert_eq!(h, back);
    }

    #[test]
    fn byte_input_exact_hex_decodes() {
        let hex64 = "ab".repeat(32);
        let input = ByteInput::parse(&hex64);
        assert_eq!(input, ByteInput::HexBytes([0xab; 32]));
        assert_eq!(input.resolve(), DataHash([0xab; 32]));
    }

    #[test]
    fn byte_input_text_hashes() {
        let input = ByteInput::parse("not hex at all");
        assert!(matches!(input, ByteInput::TextToHash(_)));
        assert_eq!(input.resolve(), hash_text_input("not hex at all"));
    }

    #[test]
    fn byte_input_64_chars_of_non_hex_is_text() {
        let s = "z".repeat(64);
        assert!(matches!(ByteInput::parse(&s), ByteInput::TextToHash(_)));
    }
}
