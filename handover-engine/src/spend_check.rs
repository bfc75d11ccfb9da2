//! State-correspondence and double-spend checks.
//!
//! Two deliberately separate operations:
//!
//! - [`precheck_source_state`] runs before submission. It is a best-effort
//!   fail-fast courtesy, not a security boundary: if the aggregator is
//!   unreachable the check is skipped with a warning and the flow proceeds,
//!   because submission itself is authoritative.
//! - [`crosscheck_proof`] runs after submission and is the mandatory
//!   security boundary. It cross-checks the locally computed transaction
//!   identity against the network-returned proof and is how a lost race is
//!   detected from locally verifiable data.
//!
//! They are never merged: only the post-check is a correctness boundary.

use tracing::{debug, warn};

use handover_core::{DataHash, InclusionProof};

use crate::aggregator::{AggregatorClient, SpentStatus};
use crate::error::{EngineError, Result};

/// Best-effort pre-submission spent check.
///
/// Returns `DoubleSpend` naming the current owner when the aggregator
/// reports the source state consumed. A network failure is downgraded to a
/// warning and `Ok(())`.
pub async fn precheck_source_state(
    client: &dyn AggregatorClient,
    source_state_hash: &DataHash,
) -> Result<()> {
    match client.spent_status(source_state_hash).await {
        Ok(SpentStatus::Unspent) => {
            debug!(%source_state_hash, "source state unspent at pre-check");
            Ok(())
        }
        Ok(SpentStatus::Spent { owner }) => Err(EngineError::DoubleSpend {
            current_owner: owner,
        }),
        Err(EngineError::Network(reason)) => {
            warn!(
                %source_state_hash,
                %reason,
                "pre-submission spent check unreachable; proceeding, submission is authoritative"
            );
            Ok(())
        }
        Err(other) => Err(other),
    }
}

/// Mandatory post-submission cross-check of the returned proof.
///
/// Order matters:
///
/// 1. The authenticator's attested source-state hash must equal the locally
///    recomputed one. A mismatch is an integrity violation: the network
///    returned a proof for some other state entirely, which no honest
///    aggregator does. It is escalated above an ordinary double-spend.
/// 2. The proof's transaction hash must equal the locally recomputed one.
///    A mismatch here, with the state hashes agreeing, is the positive
///    signature of a lost race: a competing transaction from the same source
///    state is what the ledger actually recorded. The unrelated transaction
///    is never accepted as success.
pub fn crosscheck_proof(
    local_source_state_hash: &DataHash,
    local_transaction_hash: &DataHash,
    proof: &InclusionProof,
) -> Result<()> {
    let (authenticator, recorded_tx) = match (&proof.authenticator, &proof.transaction_hash) {
        (Some(a), Some(t)) => (a, t),
        _ => {
            return Err(EngineError::Validation(
                "cannot cross-check an incomplete proof".into(),
            ))
        }
    };

    if authenticator.state_hash != *local_source_state_hash {
        return Err(EngineError::Integrity(format!(
            "proof attests source state {}, local source state is {}",
            authenticator.state_hash, local_source_state_hash
        )));
    }

    if recorded_tx != local_transaction_hash {
        debug!(
            recorded = %recorded_tx,
            local = %local_transaction_hash,
            "recorded transaction differs from local commitment: lost race"
        );
        return Err(EngineError::DoubleSpend {
            current_owner: None,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use handover_core::{hash_text_input, Authenticator, PublicKey, SignatureBytes, SigningSecret};
    use handover_test_fixtures::certified_proof;

    fn proof_for(source: DataHash, tx_hash: DataHash) -> InclusionProof {
        let owner = SigningSecret::new(b"owner".to_vec()).derive_signing_key(None);
        let authenticator = Authenticator {
            public_key: PublicKey::of(&owner),
            signature: SignatureBytes::sign(&owner, tx_hash.as_bytes()),
            state_hash: source,
        };
        certified_proof(
            &handover_core::RequestId(hash_text_input("request")),
            tx_hash,
            authenticator,
        )
    }

    #[test]
    fn matching_proof_passes() {
        let source = hash_text_input("source");
        let tx = hash_text_input("tx");
        assert!(crosscheck_proof(&source, &tx, &proof_for(source, tx)).is_ok());
    }

    #[test]
    fn transaction_mismatch_is_a_lost_race() {
        let source = hash_text_input("source");
        let proof = proof_for(source, hash_text_input("winner tx"));
        let err = crosscheck_proof(&source, &hash_text_input("our tx"), &proof).unwrap_err();
        assert!(matches!(
            err,
            EngineError::DoubleSpend { current_owner: None }
        ));
    }

    #[test]
    fn state_mismatch_is_an_integrity_violation() {
        let tx = hash_text_input("tx");
        let proof = proof_for(hash_text_input("some other state"), tx);
        let err = crosscheck_proof(&hash_text_input("our state"), &tx, &proof).unwrap_err();
        assert!(matches!(err, EngineError::Integrity(_)));
    }

    #[test]
    fn state_mismatch_outranks_transaction_mismatch() {
        // Both hashes disagree: the integrity escalation wins.
        let proof = proof_for(
            hash_text_input("other state"),
            hash_text_input("other tx"),
        );
        let err = crosscheck_proof(
            &hash_text_input("our state"),
            &hash_text_input("our tx"),
            &proof,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Integrity(_)));
    }

    #[test]
    fn incomplete_proof_cannot_be_crosschecked() {
        let source = hash_text_input("source");
        let tx = hash_text_input("tx");
        let mut proof = proof_for(source, tx);
        proof.authenticator = None;
        proof.transaction_hash = None;
        assert!(matches!(
            crosscheck_proof(&source, &tx, &proof),
            Err(EngineError::Validation(_))
        ));
    }
}
