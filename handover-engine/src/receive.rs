//! Receive orchestration.
//!
//! Wires the full flow in order: parse → package validation → proof-chain
//! validation → address self-check → best-effort spent pre-check →
//! submission → bounded polling → mandatory post-submission cross-check →
//! state mutation. Every local check precedes the first network call, and
//! the artifact is mutated only at the very end, so a failure at any stage
//! leaves the original artifact intact and PENDING.

use tokio::time::Instant;
use tracing::info;

use handover_core::{ByteInput, SigningSecret, TokenArtifact, TrustBase};

use crate::aggregator::AggregatorClient;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::finalize::finalize_receive;
use crate::poll::{submit_commitment, wait_for_proof};
use crate::resolve::resolve_recipient;
use crate::spend_check::{crosscheck_proof, precheck_source_state};
use crate::validate::{validate_package, validate_proofs, ValidationReport};

/// Result of a successful receive.
#[derive(Clone, Debug)]
pub struct ReceiveOutcome {
    /// The finalized artifact, CONFIRMED with the package consumed.
    pub artifact: TokenArtifact,
    /// Canonical JSON form of the finalized artifact.
    pub artifact_json: String,
    /// Non-fatal warnings gathered along the way.
    pub warnings: Vec<String>,
}

/// Finalize a received offline transfer.
///
/// `nonce` selects masked recipient derivation; `recipient_data` must match
/// the commitment's recipient-data-hash if one was committed. A missing
/// `trust_base` degrades proof verification to structural-only with a
/// warning.
pub async fn receive_transfer(
    artifact_json: &str,
    secret: &SigningSecret,
    nonce: Option<ByteInput>,
    recipient_data: Option<Vec<u8>>,
    trust_base: Option<&TrustBase>,
    client: &dyn AggregatorClient,
    config: &EngineConfig,
) -> Result<ReceiveOutcome> {
    let artifact = TokenArtifact::from_json(artifact_json)?;
    let mut report = ValidationReport::default();

    report.merge(validate_package(&artifact)?);
    report.merge(validate_proofs(&artifact.token, trust_base)?);

    // Primary authorization gate; fails before any network call.
    let recipient_predicate = resolve_recipient(&artifact, secret, nonce.as_ref())?;

    let package = artifact.offline_transfer.as_ref().ok_or_else(|| {
        crate::error::EngineError::Validation("nothing to receive: no pending package".into())
    })?;
    let commitment = package.commitment.clone();
    let source_state_hash = commitment.payload.source_state_hash;
    let transaction_hash = commitment.transaction_hash();
    let request_id = commitment.request_id();

    info!(%request_id, "receive validated locally; contacting aggregator");

    precheck_source_state(client, &source_state_hash).await?;

    // One overall bound: submission retries and polling share the deadline.
    let deadline = Instant::now() + config.poll_timeout;
    submit_commitment(client, &commitment, config.poll_interval, deadline).await?;
    let proof = wait_for_proof(
        client,
        &request_id,
        config.poll_interval,
        deadline,
        config.poll_timeout,
    )
    .await?;

    if let Some(trust_base) = trust_base {
        proof
            .verify_authenticator()
            .map_err(|e| crate::error::EngineError::Validation(e.to_string()))?;
        proof
            .verify_path(&request_id)
            .map_err(|e| crate::error::EngineError::Validation(e.to_string()))?;
        trust_base
            .verify_certificate(&proof.certificate)
            .map_err(|e| crate::error::EngineError::Validation(e.to_string()))?;
    }

    // The mandatory security boundary: is the recorded transaction ours?
    crosscheck_proof(&source_state_hash, &transaction_hash, &proof)?;

    let finalized = finalize_receive(&artifact, recipient_predicate, recipient_data, proof)?;
    let finalized_json = finalized.to_json()?;

    info!(
        token_id = %finalized.token.genesis.token_id,
        "receive complete; artifact confirmed"
    );

    Ok(ReceiveOutcome {
        artifact: finalized,
        artifact_json: finalized_json,
        warnings: report.warnings,
    })
}
