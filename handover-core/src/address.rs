//! Ownership addresses.
//!
//! An address is the one-way hash of a predicate reference, rendered as
//! `direct://<64 hex chars><4 hex checksum chars>`. The checksum is the
//! first two bytes of SHA-256 over the raw address bytes, which catches
//! copy/paste truncation before any cryptography runs.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{CoreError, Result};
use crate::hash::DataHash;

/// URI scheme for direct (predicate-hash) addresses.
pub const ADDRESS_SCHEME: &str = "direct://";

/// A parsed, checksum-verified ownership address.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; 32]);

impl Address {
    /// Build the address for a predicate reference hash.
    pub fn from_reference(reference: &DataHash) -> Self {
        let digest = crate::hash::DomainHasher::new(crate::hash::DOMAIN_ADDRESS)
            .update(reference.as_bytes())
            .finalize();
        Self(*digest.as_bytes())
    }

    /// Get the raw address bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Parse and checksum-verify an address string.
    pub fn parse(s: &str) -> Result<Self> {
        let rest = s
            .strip_prefix(ADDRESS_SCHEME)
            .ok_or_else(|| CoreError::AddressFormat(format!("missing {ADDRESS_SCHEME} scheme")))?;
        if rest.len() != 68 {
            return Err(CoreError::AddressFormat(format!(
                "expected 68 hex chars after scheme, got {}",
                rest.len()
            )));
        }
        let (body, checksum) = rest.split_at(64);
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(body, &mut bytes)
            .map_err(|e| CoreError::AddressFormat(e.to_string()))?;
        let addr = Self(bytes);
        if checksum != addr.checksum() {
            return Err(CoreError::AddressFormat("checksum mismatch".into()));
        }
        Ok(addr)
    }

    fn checksum(&self) -> String {
        let digest = Sha256::digest(self.0);
        hex::encode(&digest[..2])
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{ADDRESS_SCHEME}{}{}", hex::encode(self.0), self.checksum())
    }
}

impl std::fmt::Debug for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Address({self})")
    }
}

impl std::str::FromStr for Address {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Address::parse(s)
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Address::parse(&s).map_err(serde::de::Error::custom)
    }
}
