//! Ownership predicates and address derivation.
//!
//! A predicate is the locking condition embedded in a token's state. Two
//! derivation modes exist:
//!
//! - **Unmasked**: reusable; the signing key and hence the address are
//!   recoverable from the owner secret alone.
//! - **Masked**: single-use; the key is derived from the secret *and* a
//!   nonce, so the address is recoverable only with both.
//!
//! The address is a one-way hash of the predicate reference and cannot be
//! inverted back to the predicate or the secret.

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::Result;
use crate::hash::{
    DataHash, DomainHasher, DOMAIN_PREDICATE_MASKED, DOMAIN_PREDICATE_UNMASKED,
};
use crate::keys::{PublicKey, SignatureBytes, SigningSecret};

/// Immutable identity of the token a predicate locks.
///
/// Predicate references bind to the token so that the same owner key yields
/// distinct addresses for distinct tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBinding {
    /// Token identifier.
    #[serde(rename = "tokenId")]
    pub token_id: DataHash,
    /// Token type (resolved from the hex-or-text boundary input).
    #[serde(rename = "tokenType")]
    pub token_type: DataHash,
}

/// The locking condition of a token state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Predicate {
    /// Reusable predicate; key recoverable from the secret alone.
    Unmasked {
        #[serde(rename = "publicKey")]
        public_key: PublicKey,
    },
    /// One-time predicate; key recoverable only with secret + nonce.
    Masked {
        #[serde(rename = "publicKey")]
        public_key: PublicKey,
        nonce: DataHash,
    },
}

impl Predicate {
    /// Derive the reusable predicate for `secret`.
    pub fn derive_unmasked(secret: &SigningSecret) -> Self {
        let key = secret.derive_signing_key(None);
        Self::Unmasked {
            public_key: PublicKey::of(&key),
        }
    }

    /// Derive the one-time predicate for `secret` + `nonce`.
    pub fn derive_masked(secret: &SigningSecret, nonce: DataHash) -> Self {
        let key = secret.derive_signing_key(Some(&nonce));
        Self::Masked {
            public_key: PublicKey::of(&key),
            nonce,
        }
    }

    /// The public key that unlocks this predicate.
    pub fn public_key(&self) -> &PublicKey {
        match self {
            Self::Unmasked { public_key } | Self::Masked { public_key, .. } => public_key,
        }
    }

    /// Compute the predicate reference hash for a token binding.
    pub fn reference(&self, binding: &TokenBinding) -> DataHash {
        match self {
            Self::Unmasked { public_key } => DomainHasher::new(DOMAIN_PREDICATE_UNMASKED)
                .update(binding.token_id.as_bytes())
                .update(binding.token_type.as_bytes())
                .update(public_key.as_bytes())
                .finalize(),
            Self::Masked { public_key, nonce } => DomainHasher::new(DOMAIN_PREDICATE_MASKED)
                .update(binding.token_id.as_bytes())
                .update(binding.token_type.as_bytes())
                .update(public_key.as_bytes())
                .update(nonce.as_bytes())
                .finalize(),
        }
    }

    /// Compute the one-way address for this predicate on a token.
    pub fn address(&self, binding: &TokenBinding) -> Address {
        Address::from_reference(&self.reference(binding))
    }

    /// Verify an owner signature over `message` against this predicate's key.
    pub fn verify_owner_signature(
        &self,
        message: &[u8],
        signature: &SignatureBytes,
    ) -> Result<()> {
        self.public_key().verify(message, signature)
    }
}
