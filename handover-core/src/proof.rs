//! Inclusion proofs and trust-base verification.
//!
//! An inclusion proof is the ledger's evidence that a commitment was accepted
//! and recorded: a Merkle path from the transaction leaf to a certified root,
//! a BFT certificate over that root, and an authenticator attesting which
//! source state the recorded transaction consumed.
//!
//! Invariant: the authenticator and the transaction hash are both present or
//! both absent. A proof can be structurally present but semantically
//! incomplete while ledger finalization is still in progress; completeness is
//! exactly "both populated".

use serde::{Deserialize, Serialize};

use crate::commitment::RequestId;
use crate::error::{CoreError, Result};
use crate::hash::{
    DataHash, DomainHasher, DOMAIN_CERTIFICATE, DOMAIN_LEAF, DOMAIN_NODE,
};
use crate::keys::{PublicKey, SignatureBytes};

/// Attestation of the recorded transaction's provenance.
///
/// Carries the key of the owner who signed the recorded commitment, that
/// signature, and the hash of the source state the transaction consumed. The
/// attested state hash is what the post-submission integrity check compares
/// against the locally computed source state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authenticator {
    /// Public key of the recorded commitment's signer.
    #[serde(rename = "publicKey")]
    pub public_key: PublicKey,
    /// Signature over the recorded transaction hash.
    pub signature: SignatureBytes,
    /// Hash of the source state the recorded transaction consumed.
    #[serde(rename = "stateHash")]
    pub state_hash: DataHash,
}

impl Authenticator {
    /// Verify the signature over `transaction_hash`.
    pub fn verify(&self, transaction_hash: &DataHash) -> Result<()> {
        self.public_key
            .verify(transaction_hash.as_bytes(), &self.signature)
    }
}

/// One step of a Merkle inclusion path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerklePathStep {
    /// Sibling node hash.
    pub sibling: DataHash,
    /// Whether the sibling sits to the right of the running hash.
    #[serde(rename = "siblingOnRight")]
    pub sibling_on_right: bool,
}

/// A quorum member's signature over a certified root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumSignature {
    #[serde(rename = "publicKey")]
    pub public_key: PublicKey,
    pub signature: SignatureBytes,
}

/// BFT certificate over a ledger root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerCertificate {
    /// The certified Merkle root.
    #[serde(rename = "rootHash")]
    pub root_hash: DataHash,
    /// Ledger epoch the root belongs to.
    pub epoch: u64,
    /// Quorum signatures over (root, epoch).
    pub signatures: Vec<QuorumSignature>,
}

impl LedgerCertificate {
    /// The message quorum members sign.
    pub fn signing_message(root_hash: &DataHash, epoch: u64) -> DataHash {
        DomainHasher::new(DOMAIN_CERTIFICATE)
            .update(root_hash.as_bytes())
            .update(&epoch.to_be_bytes())
            .finalize()
    }
}

/// Quorum public keys used to verify ledger certificates.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrustBase {
    /// Network identifier this trust base applies to.
    pub network: String,
    /// Minimum number of distinct valid quorum signatures required.
    pub threshold: usize,
    /// Quorum member public keys.
    pub quorum: Vec<PublicKey>,
}

impl TrustBase {
    /// Verify that `certificate` carries at least `threshold` valid
    /// signatures from distinct quorum members.
    pub fn verify_certificate(&self, certificate: &LedgerCertificate) -> Result<()> {
        let message = LedgerCertificate::signing_message(&certificate.root_hash, certificate.epoch);
        let mut seen: Vec<&PublicKey> = Vec::new();
        for entry in &certificate.signatures {
            if !self.quorum.contains(&entry.public_key) {
                continue;
            }
            if seen.contains(&&entry.public_key) {
                continue;
            }
            if entry
                .public_key
                .verify(message.as_bytes(), &entry.signature)
                .is_ok()
            {
                seen.push(&entry.public_key);
            }
        }
        if seen.len() < self.threshold {
            return Err(CoreError::InvalidSignature(format!(
                "certificate quorum not met: {} valid of {} required",
                seen.len(),
                self.threshold
            )));
        }
        Ok(())
    }
}

/// Cryptographic evidence that a commitment was recorded by the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionProof {
    /// Merkle path from the transaction leaf to the certified root.
    #[serde(rename = "merklePath")]
    pub merkle_path: Vec<MerklePathStep>,
    /// BFT certificate over the root.
    pub certificate: LedgerCertificate,
    /// Authenticator; present iff `transaction_hash` is present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authenticator: Option<Authenticator>,
    /// Hash of the recorded transaction; present iff `authenticator` is present.
    #[serde(
        rename = "transactionHash",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub transaction_hash: Option<DataHash>,
}

impl InclusionProof {
    /// Whether both the authenticator and the transaction hash are populated.
    pub fn is_complete(&self) -> bool {
        self.authenticator.is_some() && self.transaction_hash.is_some()
    }

    /// Enforce the both-present-or-both-absent invariant.
    pub fn check_symmetry(&self) -> Result<()> {
        match (&self.authenticator, &self.transaction_hash) {
            (Some(_), Some(_)) | (None, None) => Ok(()),
            (Some(_), None) => Err(CoreError::AsymmetricProof(
                "authenticator present without transaction hash".into(),
            )),
            (None, Some(_)) => Err(CoreError::AsymmetricProof(
                "transaction hash present without authenticator".into(),
            )),
        }
    }

    /// Compute the Merkle leaf for a recorded transaction.
    pub fn leaf_hash(request_id: &RequestId, transaction_hash: &DataHash) -> DataHash {
        DomainHasher::new(DOMAIN_LEAF)
            .update(request_id.0.as_bytes())
            .update(transaction_hash.as_bytes())
            .finalize()
    }

    /// Fold the Merkle path and check it reconstructs the certified root.
    pub fn verify_path(&self, request_id: &RequestId) -> Result<()> {
        let tx_hash = self.transaction_hash.as_ref().ok_or_else(|| {
            CoreError::AsymmetricProof("cannot verify path of an incomplete proof".into())
        })?;
        let mut running = Self::leaf_hash(request_id, tx_hash);
        for step in &self.merkle_path {
            let node = if step.sibling_on_right {
                DomainHasher::new(DOMAIN_NODE)
                    .update(running.as_bytes())
                    .update(step.sibling.as_bytes())
            } else {
                DomainHasher::new(DOMAIN_NODE)
                    .update(step.sibling.as_bytes())
                    .update(running.as_bytes())
            };
            running = node.finalize();
        }
        if running != self.certificate.root_hash {
            return Err(CoreError::InvalidSignature(format!(
                "merkle path does not reconstruct certified root: computed {running}, certified {}",
                self.certificate.root_hash
            )));
        }
        Ok(())
    }

    /// Verify the authenticator's signature over the recorded transaction hash.
    pub fn verify_authenticator(&self) -> Result<()> {
        match (&self.authenticator, &self.transaction_hash) {
            (Some(authenticator), Some(tx_hash)) => authenticator.verify(tx_hash),
            _ => Err(CoreError::AsymmetricProof(
                "cannot verify authenticator of an incomplete proof".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::hash_text_input;
    use crate::keys::SigningSecret;

    fn quorum_keys(n: usize) -> Vec<ed25519_dalek::SigningKey> {
        (0..n)
            .map(|i| {
                SigningSecret::new(format!("quorum-{i}").into_bytes()).derive_signing_key(None)
            })
            .collect()
    }

    fn certify(root: DataHash, epoch: u64, keys: &[ed25519_dalek::SigningKey]) -> LedgerCertificate {
        let message = LedgerCertificate::signing_message(&root, epoch);
        LedgerCertificate {
            root_hash: root,
            epoch,
            signatures: keys
                .iter()
                .map(|k| QuorumSignature {
                    public_key: PublicKey::of(k),
                    signature: SignatureBytes::sign(k, message.as_bytes()),
                })
                .collect(),
        }
    }

    fn complete_proof(request_id: &RequestId, tx_hash: DataHash) -> (InclusionProof, Vec<ed25519_dalek::SigningKey>) {
        let owner = SigningSecret::new(b"owner".to_vec()).derive_signing_key(None);
        let authenticator = Authenticator {
            public_key: PublicKey::of(&owner),
            signature: SignatureBytes::sign(&owner, tx_hash.as_bytes()),
            state_hash: hash_text_input("source state"),
        };

        let leaf = InclusionProof::leaf_hash(request_id, &tx_hash);
        let sibling = hash_text_input("sibling");
        let root = DomainHasher::new(DOMAIN_NODE)
            .update(leaf.as_bytes())
            .update(sibling.as_bytes())
            .finalize();

        let keys = quorum_keys(3);
        let proof = InclusionProof {
            merkle_path: vec![MerklePathStep {
                sibling,
                sibling_on_right: true,
            }],
            certificate: certify(root, 7, &keys),
            authenticator: Some(authenticator),
            transaction_hash: Some(tx_hash),
        };
        (proof, keys)
    }

    fn sample_request_id() -> RequestId {
        RequestId(hash_text_input("request"))
    }

    #[test]
    fn symmetry_invariant_enforced() {
        let (mut proof, _) = complete_proof(&sample_request_id(), hash_text_input("tx"));
        assert!(proof.check_symmetry().is_ok());
        assert!(proof.is_complete());

        proof.transaction_hash = None;
        assert!(matches!(
            proof.check_symmetry(),
            Err(CoreError::AsymmetricProof(_))
        ));
        assert!(!proof.is_complete());
    }

    #[test]
    fn path_verification_round_trip() {
        let request_id = sample_request_id();
        let (proof, _) = complete_proof(&request_id, hash_text_input("tx"));
        assert!(proof.verify_path(&request_id).is_ok());

        // A proof for a different request id must not verify.
        let other = RequestId(hash_text_input("other request"));
        assert!(proof.verify_path(&other).is_err());
    }

    #[test]
    fn authenticator_verification() {
        let (proof, _) = complete_proof(&sample_request_id(), hash_text_input("tx"));
        assert!(proof.verify_authenticator().is_ok());

        let mut tampered = proof.clone();
        tampered.transaction_hash = Some(hash_text_input("different tx"));
        assert!(tampered.verify_authenticator().is_err());
    }

    #[test]
    fn certificate_quorum_threshold() {
        let request_id = sample_request_id();
        let (proof, keys) = complete_proof(&request_id, hash_text_input("tx"));
        let trust_base = TrustBase {
            network: "testnet".into(),
            threshold: 2,
            quorum: keys.iter().map(PublicKey::of).collect(),
        };
        assert!(trust_base.verify_certificate(&proof.certificate).is_ok());

        // Keys outside the quorum contribute nothing.
        let strangers = TrustBase {
            network: "testnet".into(),
            threshold: 2,
            quorum: quorum_keys(3)
                .iter()
                .skip(10) // empty
                .map(PublicKey::of)
                .collect(),
        };
        assert!(strangers.verify_certificate(&proof.certificate).is_err());

        // Threshold above the available signatures fails.
        let strict = TrustBase {
            network: "testnet".into(),
            threshold: 4,
            quorum: keys.iter().map(PublicKey::of).collect(),
        };
        assert!(strict.verify_certificate(&proof.certificate).is_err());
    }

    #[test]
    fn duplicate_quorum_signatures_counted_once() {
        let request_id = sample_request_id();
        let (mut proof, keys) = complete_proof(&request_id, hash_text_input("tx"));
        let first = proof.certificate.signatures[0].clone();
        proof.certificate.signatures = vec![first.clone(), first];

        let trust_base = TrustBase {
            network: "testnet".into(),
            threshold: 2,
            quorum: keys.iter().map(PublicKey::of).collect(),
        };
        assert!(trust_base.verify_certificate(&proof.certificate).is_err());
    }

    #[test]
    fn proof_serde_round_trip() {
        let (proof, _) = complete_proof(&sample_request_id(), hash_text_input("tx"));
        let json = serde_json::to_string(&proof).unwrap();
        let back: InclusionProof = serde_json::from_str(&json).unwrap();
        assert_eq!(proof, back);
    }
}
