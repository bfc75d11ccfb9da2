//! Transfer commitments.
//!
//! A commitment is a signed, content-addressed proposal to transition a
//! token's ownership state. It is built fully offline: the payload references
//! the current source state, names a destination address, and carries a fresh
//! random salt so that two commitments from the same source state to the same
//! destination are still distinct.

use ed25519_dalek::SigningKey;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::Result;
use crate::hash::{DataHash, DomainHasher, DOMAIN_REQUEST_ID, DOMAIN_TRANSACTION};
use crate::keys::{PublicKey, SignatureBytes};

/// The aggregator-facing identity of a commitment.
///
/// Derived from the signer's public key and the source state it proposes to
/// transition, so every (owner, source state) pair maps to exactly one slot
/// on the ledger. Competing transitions from the same source state collide on
/// this id; the ledger records the first and the loser detects the race from
/// the returned proof.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub DataHash);

impl RequestId {
    /// Compute the request id for a signer and source state.
    pub fn derive(signer: &PublicKey, source_state_hash: &DataHash) -> Self {
        Self(
            DomainHasher::new(DOMAIN_REQUEST_ID)
                .update(signer.as_bytes())
                .update(source_state_hash.as_bytes())
                .finalize(),
        )
    }

    /// Render as unprefixed hex (URL path segment form).
    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }
}

impl std::fmt::Debug for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RequestId({})", self.0)
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The unsigned body of a transfer commitment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferPayload {
    /// Hash of the source state being consumed.
    #[serde(rename = "sourceStateHash")]
    pub source_state_hash: DataHash,
    /// Destination address receiving ownership.
    pub destination: Address,
    /// Optional commitment to the recipient's state data.
    #[serde(
        rename = "recipientDataHash",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub recipient_data_hash: Option<DataHash>,
    /// Optional free-text message carried to the recipient.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Fresh random salt making the commitment content-addressed and unique.
    pub salt: DataHash,
}

impl TransferPayload {
    /// Generate a fresh random salt.
    pub fn random_salt<R: RngCore + CryptoRng>(rng: &mut R) -> DataHash {
        let mut bytes = [0u8; 32];
        rng.fill_bytes(&mut bytes);
        DataHash::from_bytes(bytes)
    }

    /// Compute the transaction hash: the content address of this payload.
    ///
    /// A function of the source state, destination, salt, message and
    /// recipient-data-hash; the post-submission cross-check recomputes this
    /// locally and compares it against the proof returned by the network.
    pub fn transaction_hash(&self) -> DataHash {
        DomainHasher::new(DOMAIN_TRANSACTION)
            .update(self.source_state_hash.as_bytes())
            .update(self.destination.as_bytes())
            .update_opt(self.recipient_data_hash.as_ref().map(|h| h.as_bytes().as_slice()))
            .update_opt(self.message.as_ref().map(|m| m.as_bytes()))
            .update(self.salt.as_bytes())
            .finalize()
    }
}

/// A signed transfer commitment, immutable once built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferCommitment {
    /// The transaction payload.
    pub payload: TransferPayload,
    /// Public key of the source-state owner who signed the payload.
    #[serde(rename = "publicKey")]
    pub public_key: PublicKey,
    /// Signature over the transaction hash.
    pub signature: SignatureBytes,
}

impl TransferCommitment {
    /// Sign `payload` with the owner key of the source state.
    pub fn sign(payload: TransferPayload, key: &SigningKey) -> Self {
        let tx_hash = payload.transaction_hash();
        let signature = SignatureBytes::sign(key, tx_hash.as_bytes());
        Self {
            payload,
            public_key: PublicKey::of(key),
            signature,
        }
    }

    /// The transaction hash this commitment is signed over.
    pub fn transaction_hash(&self) -> DataHash {
        self.payload.transaction_hash()
    }

    /// The aggregator request id for this commitment.
    pub fn request_id(&self) -> RequestId {
        RequestId::derive(&self.public_key, &self.payload.source_state_hash)
    }

    /// Verify the embedded signature.
    pub fn verify_signature(&self) -> Result<()> {
        self.public_key
            .verify(self.transaction_hash().as_bytes(), &self.signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::hash_text_input;
    use crate::keys::SigningSecret;
    use rand::rngs::OsRng;

    fn payload_to(dest_seed: &str, salt: DataHash) -> TransferPayload {
        TransferPayload {
            source_state_hash: hash_text_input("source state"),
            destination: Address::from_reference(&hash_text_input(dest_seed)),
            recipient_data_hash: None,
            message: Some("for you".into()),
            salt,
        }
    }

    #[test]
    fn transaction_hash_depends_on_every_field() {
        let salt = hash_text_input("salt");
        let base = payload_to("bob", salt);

        let mut other = base.clone();
        other.message = None;
        assert_ne!(base.transaction_hash(), other.transaction_hash());

        let mut other = base.clone();
        other.recipient_data_hash = Some(hash_text_input("data"));
        assert_ne!(base.transaction_hash(), other.transaction_hash());

        let other = payload_to("carol", salt);
        assert_ne!(base.transaction_hash(), other.transaction_hash());

        let other = payload_to("bob", hash_text_input("other salt"));
        assert_ne!(base.transaction_hash(), other.transaction_hash());
    }

    #[test]
    fn same_source_same_signer_same_request_id() {
        let secret = SigningSecret::new(b"alice".to_vec());
        let key = secret.derive_signing_key(None);

        let c1 = TransferCommitment::sign(
            payload_to("bob", TransferPayload::random_salt(&mut OsRng)),
            &key,
        );
        let c2 = TransferCommitment::sign(
            payload_to("carol", TransferPayload::random_salt(&mut OsRng)),
            &key,
        );

        // Competing transitions from one source state collide on the request id
        // while remaining independently trackable commitments.
        assert_eq!(c1.request_id(), c2.request_id());
        assert_ne!(c1.transaction_hash(), c2.transaction_hash());
    }

    #[test]
    fn signature_verifies_and_rejects_tampering() {
        let secret = SigningSecret::new(b"alice".to_vec());
        let key = secret.derive_signing_key(None);
        let mut commitment = TransferCommitment::sign(
            payload_to("bob", TransferPayload::random_salt(&mut OsRng)),
            &key,
        );
        assert!(commitment.verify_signature().is_ok());

        commitment.payload.message = Some("tampered".into());
        assert!(commitment.verify_signature().is_err());
    }

    #[test]
    fn commitment_serde_round_trip() {
        let secret = SigningSecret::new(b"alice".to_vec());
        let key = secret.derive_signing_key(None);
        let commitment =
            TransferCommitment::sign(payload_to("bob", hash_text_input("salt")), &key);
        let json = serde_json::to_string(&commitment).unwrap();
        let back: TransferCommitment = serde_json::from_str(&json).unwrap();
        assert_eq!(commitment, back);
        assert!(back.verify_signature().is_ok());
    }
}
