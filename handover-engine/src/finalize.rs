//! Token state mutation and artifact assembly.
//!
//! The only point in the engine where the artifact changes. Reached only
//! after validation, the address self-check, submission and the
//! post-submission cross-check have all succeeded; until then the original
//! artifact remains untouched, so no partial-commit state can exist.

use tracing::info;

use handover_core::{
    InclusionProof, Predicate, TokenArtifact, TokenState, TokenTransaction, TransferStatus,
};

use crate::error::{EngineError, Result};

/// Consume the pending package: build the new state, append the finalized
/// transaction, strip the package, mark the artifact CONFIRMED.
///
/// The recipient data is checked against the hash the commitment committed
/// to before any state is constructed.
pub fn finalize_receive(
    artifact: &TokenArtifact,
    recipient_predicate: Predicate,
    recipient_data: Option<Vec<u8>>,
    proof: InclusionProof,
) -> Result<TokenArtifact> {
    let package = artifact
        .offline_transfer
        .as_ref()
        .ok_or_else(|| EngineError::Validation("no pending package to finalize".into()))?;
    let commitment = package.commitment.clone();

    let state = TokenState::new_checked(
        recipient_predicate,
        recipient_data,
        commitment.payload.recipient_data_hash.as_ref(),
    )?;

    let mut updated = artifact.clone();
    updated
        .token
        .transactions
        .push(TokenTransaction { commitment, proof });
    updated.token.state = state;
    updated.status = TransferStatus::Confirmed;
    updated.offline_transfer = None;

    info!(
        token_id = %updated.token.genesis.token_id,
        transactions = updated.token.transaction_count(),
        "transfer finalized"
    );
    Ok(updated)
}
