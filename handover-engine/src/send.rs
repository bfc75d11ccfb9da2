//! Sender side: building the offline transfer package.
//!
//! Produces a signed commitment and wraps it into a PENDING package with no
//! network contact at all, which is what makes true offline hand-off (file,
//! QR, email) possible. The only validation that runs here is local: the
//! destination address is parsed before any cryptography, and the owner
//! secret must actually control the current state.

use rand::rngs::OsRng;
use tracing::info;

use handover_core::{
    Address, DataHash, OfflinePackage, Predicate, PublicKey, SigningSecret, TokenArtifact,
    TransferCommitment, TransferPayload, TransferStatus,
};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};

/// Build a transfer commitment and attach it to the artifact as a PENDING
/// offline package.
///
/// Returns the updated artifact; the caller persists it and hands its JSON
/// form to the recipient out-of-band. The input artifact is not mutated.
pub fn prepare_transfer(
    artifact: &TokenArtifact,
    secret: &SigningSecret,
    destination: &str,
    recipient_data_hash: Option<DataHash>,
    message: Option<String>,
    config: &EngineConfig,
) -> Result<TokenArtifact> {
    // Malformed destinations are rejected before any cryptography runs.
    let destination = Address::parse(destination)
        .map_err(|e| EngineError::AddressFormat(e.to_string()))?;

    if artifact.offline_transfer.is_some() {
        return Err(EngineError::Validation(
            "a transfer is already pending on this artifact".into(),
        ));
    }

    let binding = artifact.token.binding();
    let predicate = &artifact.token.state.predicate;

    // The signing key must re-derive the key locked into the current state.
    let nonce = match predicate {
        Predicate::Masked { nonce, .. } => Some(*nonce),
        Predicate::Unmasked { .. } => None,
    };
    let key = secret.derive_signing_key(nonce.as_ref());
    if PublicKey::of(&key) != *predicate.public_key() {
        return Err(EngineError::Validation(
            "secret does not control the current token state".into(),
        ));
    }

    let payload = TransferPayload {
        source_state_hash: artifact.token.current_state_hash(),
        destination,
        recipient_data_hash,
        message: message.clone(),
        salt: TransferPayload::random_salt(&mut OsRng),
    };
    let commitment = TransferCommitment::sign(payload, &key);
    let commitment_data = serde_json::to_string(&commitment)?;

    info!(
        request_id = %commitment.request_id(),
        destination = %destination,
        "built offline transfer commitment"
    );

    let package = OfflinePackage {
        sender: predicate.address(&binding),
        recipient: destination,
        network: config.network.clone(),
        message,
        commitment,
        commitment_data,
    };

    let mut updated = artifact.clone();
    updated.status = TransferStatus::Pending;
    updated.offline_transfer = Some(package);
    Ok(updated)
}
