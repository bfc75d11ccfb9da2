//! Package and proof validation.
//!
//! Everything here runs locally, before the first network call. Validation
//! distinguishes fatal errors (malformed or inconsistent packages, broken
//! proofs) from non-fatal warnings (unknown future versions, degraded
//! verification without a trust base); warnings are collected into the
//! report and also logged.

use tracing::warn;

use handover_core::{
    InclusionProof, RequestId, Token, TokenArtifact, TrustBase, ARTIFACT_VERSION,
};

use crate::error::{EngineError, Result};

/// Outcome of a validation pass that succeeded, possibly with caveats.
#[derive(Clone, Debug, Default)]
pub struct ValidationReport {
    /// Non-fatal findings the caller should surface.
    pub warnings: Vec<String>,
}

impl ValidationReport {
    fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{message}");
        self.warnings.push(message);
    }

    /// Merge another report's warnings into this one.
    pub fn merge(&mut self, other: ValidationReport) {
        self.warnings.extend(other.warnings);
    }
}

/// Validate a received artifact before any cryptography or network traffic.
///
/// Checks run in order: pending package present, package internally
/// consistent, embedded proofs structurally sound, declared status consistent
/// with the transaction history. JSON well-formedness is checked upstream at
/// parse time.
pub fn validate_package(artifact: &TokenArtifact) -> Result<ValidationReport> {
    let mut report = ValidationReport::default();

    if artifact.version > ARTIFACT_VERSION {
        report.warn(format!(
            "artifact version {} is newer than supported version {ARTIFACT_VERSION}; \
             proceeding on a best-effort basis",
            artifact.version
        ));
    }

    // Absence of a pending package is fatal: there is nothing to receive.
    let package = artifact
        .offline_transfer
        .as_ref()
        .ok_or_else(|| EngineError::Validation("nothing to receive: no pending package".into()))?;

    if !artifact.status_is_consistent() {
        return Err(EngineError::Validation(format!(
            "declared status {:?} is inconsistent with the package section",
            artifact.status
        )));
    }

    // The detached serialized commitment must match the structured one.
    let reparsed: handover_core::TransferCommitment =
        serde_json::from_str(&package.commitment_data).map_err(|e| {
            EngineError::Validation(format!("package commitmentData is malformed: {e}"))
        })?;
    if reparsed != package.commitment {
        return Err(EngineError::Validation(
            "package commitmentData does not match the embedded commitment".into(),
        ));
    }

    package
        .commitment
        .verify_signature()
        .map_err(|e| EngineError::Validation(format!("commitment signature invalid: {e}")))?;

    // The sender must be the owner locked into the current state.
    if package.commitment.public_key != *artifact.token.state.predicate.public_key() {
        return Err(EngineError::Validation(
            "commitment signer is not the current state owner".into(),
        ));
    }
    let binding = artifact.token.binding();
    if package.sender != artifact.token.state.predicate.address(&binding) {
        return Err(EngineError::Validation(
            "package sender address does not match the current state".into(),
        ));
    }

    // A stale package referencing an older source state can never finalize.
    if package.commitment.payload.source_state_hash != artifact.token.current_state_hash() {
        return Err(EngineError::Validation(
            "commitment does not reference the token's current state".into(),
        ));
    }

    if package.recipient != package.commitment.payload.destination {
        return Err(EngineError::Validation(
            "package recipient does not match the commitment destination".into(),
        ));
    }

    // Structural soundness of every embedded proof.
    check_embedded_proof(&artifact.token.genesis.proof, "genesis")?;
    for (index, tx) in artifact.token.transactions.iter().enumerate() {
        check_embedded_proof(&tx.proof, &format!("transaction {index}"))?;
    }

    Ok(report)
}

fn check_embedded_proof(proof: &InclusionProof, context: &str) -> Result<()> {
    proof
        .check_symmetry()
        .map_err(|e| EngineError::Validation(format!("{context} proof: {e}")))?;
    if !proof.is_complete() {
        return Err(EngineError::Validation(format!(
            "{context} proof is incomplete: the recorded history must be finalized"
        )));
    }
    Ok(())
}

/// Validate the proof chain: genesis plus every historical transaction.
///
/// Structural checks always run. With a trust base, the authenticator
/// signature, the Merkle path and the certificate quorum are verified for
/// each proof. Without one, validation degrades to structural-only and says
/// so explicitly; it never silently claims full verification.
pub fn validate_proofs(token: &Token, trust_base: Option<&TrustBase>) -> Result<ValidationReport> {
    let mut report = ValidationReport::default();

    let mut entries: Vec<(RequestId, &InclusionProof, String)> = vec![(
        token.genesis.request_id(),
        &token.genesis.proof,
        "genesis".to_string(),
    )];
    for (index, tx) in token.transactions.iter().enumerate() {
        entries.push((
            tx.commitment.request_id(),
            &tx.proof,
            format!("transaction {index}"),
        ));
    }

    for (request_id, proof, context) in &entries {
        check_embedded_proof(proof, context)?;

        let Some(trust_base) = trust_base else {
            continue;
        };

        proof.verify_authenticator().map_err(|e| {
            EngineError::Validation(format!("{context} proof authenticator: {e}"))
        })?;
        proof
            .verify_path(request_id)
            .map_err(|e| EngineError::Validation(format!("{context} proof path: {e}")))?;
        trust_base
            .verify_certificate(&proof.certificate)
            .map_err(|e| EngineError::Validation(format!("{context} proof certificate: {e}")))?;
    }

    if trust_base.is_none() {
        report.warn(
            "no trust base supplied: proofs were validated structurally only, \
             not cryptographically",
        );
    }

    Ok(report)
}
