//! Deterministic fixtures reused across engine tests: named secrets, a
//! fixture quorum and trust base, certified inclusion proofs, freshly minted
//! tokens, and an in-memory mock aggregator implementing the engine's
//! client trait with first-writer-wins ledger semantics.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use ed25519_dalek::SigningKey;

use handover_core::hash::{DomainHasher, DOMAIN_NODE};
use handover_core::{
    hash_text_input, Address, Authenticator, DataHash, InclusionProof, LedgerCertificate,
    MerklePathStep, Predicate, PublicKey, QuorumSignature, RequestId, SignatureBytes,
    SigningSecret, Token, TokenArtifact, TokenGenesis, TokenState, TransferCommitment,
    TransferPayload, TrustBase,
};
use handover_engine::{
    prepare_transfer, AggregatorClient, EngineConfig, EngineError, SpentStatus, SubmitStatus,
};

/// Size of the fixture quorum.
pub const QUORUM_SIZE: usize = 3;
/// Signatures required by the fixture trust base.
pub const QUORUM_THRESHOLD: usize = 2;

/// A deterministic named secret.
pub fn secret(name: &str) -> SigningSecret {
    SigningSecret::new(format!("fixture-secret:{name}").into_bytes())
}

/// The fixture quorum signing keys.
pub fn quorum_keys() -> Vec<SigningKey> {
    (0..QUORUM_SIZE)
        .map(|i| secret(&format!("quorum-{i}")).derive_signing_key(None))
        .collect()
}

/// Trust base matching [`quorum_keys`].
pub fn trust_base() -> TrustBase {
    TrustBase {
        network: "testnet".into(),
        threshold: QUORUM_THRESHOLD,
        quorum: quorum_keys().iter().map(PublicKey::of).collect(),
    }
}

/// Build a complete inclusion proof certified by the fixture quorum.
pub fn certified_proof(
    request_id: &RequestId,
    transaction_hash: DataHash,
    authenticator: Authenticator,
) -> InclusionProof {
    let leaf = InclusionProof::leaf_hash(request_id, &transaction_hash);
    let sibling = hash_text_input(&format!("fixture-sibling:{request_id}"));
    let root = DomainHasher::new(DOMAIN_NODE)
        .update(leaf.as_bytes())
        .update(sibling.as_bytes())
        .finalize();

    let message = LedgerCertificate::signing_message(&root, 1);
    let signatures = quorum_keys()
        .iter()
        .map(|key| QuorumSignature {
            public_key: PublicKey::of(key),
            signature: SignatureBytes::sign(key, message.as_bytes()),
        })
        .collect();

    InclusionProof {
        merkle_path: vec![MerklePathStep {
            sibling,
            sibling_on_right: true,
        }],
        certificate: LedgerCertificate {
            root_hash: root,
            epoch: 1,
            signatures,
        },
        authenticator: Some(authenticator),
        transaction_hash: Some(transaction_hash),
    }
}

/// Certified proof recording exactly the given commitment.
pub fn certified_proof_for_commitment(commitment: &TransferCommitment) -> InclusionProof {
    let authenticator = Authenticator {
        public_key: commitment.public_key,
        signature: commitment.signature,
        state_hash: commitment.payload.source_state_hash,
    };
    certified_proof(
        &commitment.request_id(),
        commitment.transaction_hash(),
        authenticator,
    )
}

/// Mint a confirmed token locked by the owner's reusable predicate.
pub fn mint_unmasked(owner: &SigningSecret, token_name: &str) -> TokenArtifact {
    let predicate = Predicate::derive_unmasked(owner);
    mint_with_predicate(predicate, token_name)
}

/// Mint a confirmed token locked by the given predicate.
pub fn mint_with_predicate(predicate: Predicate, token_name: &str) -> TokenArtifact {
    let token_id = hash_text_input(token_name);
    let token_type = hash_text_input("fungible");
    let binding = handover_core::TokenBinding {
        token_id,
        token_type,
    };

    let minter = secret("minter").derive_signing_key(None);
    let payload = TransferPayload {
        source_state_hash: handover_core::mint_source_state_hash(&binding),
        destination: predicate.address(&binding),
        recipient_data_hash: None,
        message: None,
        salt: hash_text_input(&format!("mint-salt:{token_name}")),
    };
    let commitment = TransferCommitment::sign(payload, &minter);
    let proof = certified_proof_for_commitment(&commitment);

    TokenArtifact::confirmed(Token {
        genesis: TokenGenesis {
            token_id,
            token_type,
            commitment,
            proof,
        },
        transactions: vec![],
        state: TokenState {
            predicate,
            data: None,
        },
    })
}

/// Attach a pending package transferring the artifact to `recipient`.
pub fn pending_package_to(
    artifact: &TokenArtifact,
    sender: &SigningSecret,
    recipient: &Address,
) -> TokenArtifact {
    pending_package_with_data(artifact, sender, recipient, None)
}

/// Attach a pending package, optionally committing to recipient data.
pub fn pending_package_with_data(
    artifact: &TokenArtifact,
    sender: &SigningSecret,
    recipient: &Address,
    recipient_data_hash: Option<DataHash>,
) -> TokenArtifact {
    prepare_transfer(
        artifact,
        sender,
        &recipient.to_string(),
        recipient_data_hash,
        Some("fixture transfer".into()),
        &EngineConfig::default(),
    )
    .expect("fixture transfer must build")
}

struct SlotRecord {
    transaction_hash: DataHash,
    proof: InclusionProof,
}

#[derive(Default)]
struct MockLedger {
    /// Recorded transaction per request id; first writer wins, no overwrite.
    slots: HashMap<String, SlotRecord>,
    /// Consumed source states and the destination that now owns the token.
    spent: HashMap<String, Address>,
}

/// In-memory aggregator with the semantics the engine relies on:
///
/// - first commitment per request id is recorded and wins;
/// - an identical resubmission answers `REQUEST_ID_EXISTS`;
/// - a *different* commitment racing on the same request id is accepted
///   without overwriting, so its proof later reveals the winner;
/// - proofs are certified by the fixture quorum.
///
/// Call counters let tests assert that rejections happened before any
/// network traffic.
#[derive(Default)]
pub struct MockAggregator {
    ledger: Mutex<MockLedger>,
    submit_calls: AtomicUsize,
    proof_calls: AtomicUsize,
    spent_calls: AtomicUsize,
    withhold_proofs: AtomicBool,
    spent_check_offline: AtomicBool,
    incomplete_polls: AtomicUsize,
    transient_submit_failures: AtomicUsize,
}

impl MockAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Never return proofs, forcing the polling bound to expire.
    pub fn withhold_proofs(&self, withhold: bool) {
        self.withhold_proofs.store(withhold, Ordering::SeqCst);
    }

    /// Make the spent-status endpoint unreachable.
    pub fn set_spent_check_offline(&self, offline: bool) {
        self.spent_check_offline.store(offline, Ordering::SeqCst);
    }

    /// Serve `count` incomplete proofs before the complete one, simulating
    /// in-progress ledger finalization.
    pub fn serve_incomplete_polls(&self, count: usize) {
        self.incomplete_polls.store(count, Ordering::SeqCst);
    }

    /// Answer the next `count` submissions with an opaque transient status,
    /// forcing the submission phase to retry.
    pub fn serve_transient_submit_failures(&self, count: usize) {
        self.transient_submit_failures.store(count, Ordering::SeqCst);
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn proof_calls(&self) -> usize {
        self.proof_calls.load(Ordering::SeqCst)
    }

    pub fn spent_calls(&self) -> usize {
        self.spent_calls.load(Ordering::SeqCst)
    }

    /// Total network calls observed.
    pub fn network_calls(&self) -> usize {
        self.submit_calls() + self.proof_calls() + self.spent_calls()
    }
}

#[async_trait]
impl AggregatorClient for MockAggregator {
    async fn submit_commitment(
        &self,
        commitment: &TransferCommitment,
    ) -> handover_engine::Result<SubmitStatus> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        if self
            .transient_submit_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Ok(SubmitStatus::Other("BUSY".into()));
        }
        let key = commitment.request_id().to_hex();
        let transaction_hash = commitment.transaction_hash();

        let mut ledger = self.ledger.lock().expect("mock ledger poisoned");
        match ledger.slots.get(&key) {
            Some(slot) if slot.transaction_hash == transaction_hash => {
                Ok(SubmitStatus::RequestIdExists)
            }
            // A competing commitment on an occupied slot is accepted but not
            // recorded; the proof it polls for names the winner.
            Some(_) => Ok(SubmitStatus::Success),
            None => {
                let proof = certified_proof_for_commitment(commitment);
                ledger.slots.insert(
                    key,
                    SlotRecord {
                        transaction_hash,
                        proof,
                    },
                );
                ledger.spent.insert(
                    commitment.payload.source_state_hash.to_hex(),
                    commitment.payload.destination,
                );
                Ok(SubmitStatus::Success)
            }
        }
    }

    async fn inclusion_proof(
        &self,
        request_id: &RequestId,
    ) -> handover_engine::Result<Option<InclusionProof>> {
        self.proof_calls.fetch_add(1, Ordering::SeqCst);
        if self.withhold_proofs.load(Ordering::SeqCst) {
            return Ok(None);
        }

        let ledger = self.ledger.lock().expect("mock ledger poisoned");
        let Some(slot) = ledger.slots.get(&request_id.to_hex()) else {
            return Ok(None);
        };

        if self
            .incomplete_polls
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            let mut partial = slot.proof.clone();
            partial.authenticator = None;
            partial.transaction_hash = None;
            return Ok(Some(partial));
        }

        Ok(Some(slot.proof.clone()))
    }

    async fn spent_status(&self, state_hash: &DataHash) -> handover_engine::Result<SpentStatus> {
        if self.spent_check_offline.load(Ordering::SeqCst) {
            return Err(EngineError::Network(
                "mock spent-status endpoint offline".into(),
            ));
        }
        self.spent_calls.fetch_add(1, Ordering::SeqCst);

        let ledger = self.ledger.lock().expect("mock ledger poisoned");
        match ledger.spent.get(&state_hash.to_hex()) {
            Some(owner) => Ok(SpentStatus::Spent {
                owner: Some(*owner),
            }),
            None => Ok(SpentStatus::Unspent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_writer_wins_and_identical_resubmission_is_flagged() {
        let aggregator = MockAggregator::new();
        let alice = secret("alice");
        let artifact = mint_unmasked(&alice, "token-1");
        let bob = Predicate::derive_unmasked(&secret("bob"));
        let carol = Predicate::derive_unmasked(&secret("carol"));
        let binding = artifact.token.binding();

        let to_bob = pending_package_to(&artifact, &alice, &bob.address(&binding));
        let to_carol = pending_package_to(&artifact, &alice, &carol.address(&binding));
        let c_bob = to_bob.offline_transfer.as_ref().unwrap().commitment.clone();
        let c_carol = to_carol.offline_transfer.as_ref().unwrap().commitment.clone();

        assert_eq!(
            aggregator.submit_commitment(&c_bob).await.unwrap(),
            SubmitStatus::Success
        );
        assert_eq!(
            aggregator.submit_commitment(&c_bob).await.unwrap(),
            SubmitStatus::RequestIdExists
        );
        // Competing commitment, same slot: accepted but not recorded.
        assert_eq!(
            aggregator.submit_commitment(&c_carol).await.unwrap(),
            SubmitStatus::Success
        );

        let proof = aggregator
            .inclusion_proof(&c_carol.request_id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(proof.transaction_hash, Some(c_bob.transaction_hash()));
    }

    #[tokio::test]
    async fn spent_tracking_names_the_winner() {
        let aggregator = MockAggregator::new();
        let alice = secret("alice");
        let artifact = mint_unmasked(&alice, "token-2");
        let bob = Predicate::derive_unmasked(&secret("bob"));
        let binding = artifact.token.binding();
        let bob_address = bob.address(&binding);

        let source = artifact.token.current_state_hash();
        assert_eq!(
            aggregator.spent_status(&source).await.unwrap(),
            SpentStatus::Unspent
        );

        let pending = pending_package_to(&artifact, &alice, &bob_address);
        let commitment = pending.offline_transfer.as_ref().unwrap().commitment.clone();
        aggregator.submit_commitment(&commitment).await.unwrap();

        assert_eq!(
            aggregator.spent_status(&source).await.unwrap(),
            SpentStatus::Spent {
                owner: Some(bob_address)
            }
        );
    }

    #[test]
    fn fixture_proofs_verify_against_fixture_trust_base() {
        let artifact = mint_unmasked(&secret("alice"), "token-3");
        let proof = &artifact.token.genesis.proof;
        let request_id = artifact.token.genesis.request_id();
        assert!(proof.verify_authenticator().is_ok());
        assert!(proof.verify_path(&request_id).is_ok());
        assert!(trust_base().verify_certificate(&proof.certificate).is_ok());
    }
}
