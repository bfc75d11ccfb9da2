//! Owner secrets and signing keys.
//!
//! The owner secret is arbitrary byte material supplied by the caller for a
//! single operation; it is never stored in engine state and is zeroized on
//! drop. Signing keys are derived deterministically from the secret (plus a
//! nonce for masked predicates) so that the same inputs always reproduce the
//! same key pair.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CoreError, Result};
use crate::hash::{DataHash, DomainHasher, DOMAIN_KEY_SEED};

/// Owner secret material, zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SigningSecret {
    inner: Vec<u8>,
}

impl SigningSecret {
    /// Wrap raw secret bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            inner: bytes.into(),
        }
    }

    /// Get the raw secret bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.inner
    }

    /// Derive the ed25519 signing key for this secret.
    ///
    /// With `nonce = None` this is the reusable (unmasked) key: recoverable
    /// from the secret alone. With a nonce it is the one-time (masked) key:
    /// recoverable only with the matching secret **and** nonce.
    pub fn derive_signing_key(&self, nonce: Option<&DataHash>) -> SigningKey {
        let seed = DomainHasher::new(DOMAIN_KEY_SEED)
            .update(&self.inner)
            .update_opt(nonce.map(|n| n.as_bytes().as_slice()))
            .finalize();
        SigningKey::from_bytes(seed.as_bytes())
    }
}

impl std::fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never expose the secret bytes in debug output
        f.debug_struct("SigningSecret").finish_non_exhaustive()
    }
}

/// An ed25519 public key, serialized as a hex string.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey(pub [u8; 32]);

impl PublicKey {
    /// Public key of a signing key.
    pub fn of(key: &SigningKey) -> Self {
        Self(key.verifying_key().to_bytes())
    }

    /// Get the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|e| CoreError::InvalidHex(e.to_string()))?;
        Ok(Self(bytes))
    }

    /// Verify `signature` over `message` with this key.
    pub fn verify(&self, message: &[u8], signature: &SignatureBytes) -> Result<()> {
        let key = VerifyingKey::from_bytes(&self.0)
            .map_err(|e| CoreError::InvalidKey(e.to_string()))?;
        let sig = Signature::from_bytes(&signature.0);
        key.verify(message, &sig)
            .map_err(|e| CoreError::InvalidSignature(e.to_string()))
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PublicKey(0x{})", hex::encode(self.0))
    }
}

impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PublicKey::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// A detached ed25519 signature, serialized as a hex string.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SignatureBytes(pub [u8; 64]);

impl SignatureBytes {
    /// Sign `message` with `key`.
    pub fn sign(key: &SigningKey, message: &[u8]) -> Self {
        Self(key.sign(message).to_bytes())
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; 64];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|e| CoreError::InvalidHex(e.to_string()))?;
        Ok(Self(bytes))
    }
}

impl std::fmt::Debug for SignatureBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SignatureBytes(0x{})", hex::encode(self.0))
    }
}

impl Serialize for SignatureBytes {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for SignatureBytes {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        SignatureBytes::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
