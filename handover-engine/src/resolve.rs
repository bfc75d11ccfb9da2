//! Recipient predicate resolution and the address self-check.
//!
//! The primary authorization gate of the receive flow: re-derive the
//! candidate recipient predicate from the supplied secret (and nonce, for
//! masked addresses) and compare its address byte-for-byte against the
//! package's declared recipient. A mismatch fails here, before any network
//! call, so a caller holding the wrong secret gets an immediate rejection
//! and never leaks intent to the network for an address they do not control.

use handover_core::{ByteInput, Predicate, SigningSecret, TokenArtifact};

use crate::error::{EngineError, Result};

/// Re-derive the recipient predicate and verify it matches the package's
/// declared recipient address.
///
/// A nonce selects masked (one-time) derivation; without one the reusable
/// unmasked predicate is derived. The nonce is resolved exactly once here:
/// 64 hex chars are taken as raw bytes, anything else is hashed down.
pub fn resolve_recipient(
    artifact: &TokenArtifact,
    secret: &SigningSecret,
    nonce: Option<&ByteInput>,
) -> Result<Predicate> {
    let package = artifact
        .offline_transfer
        .as_ref()
        .ok_or_else(|| EngineError::Validation("nothing to receive: no pending package".into()))?;

    let predicate = match nonce {
        Some(input) => Predicate::derive_masked(secret, input.resolve()),
        None => Predicate::derive_unmasked(secret),
    };

    let derived = predicate.address(&artifact.token.binding());
    if derived != package.recipient {
        return Err(EngineError::AddressMismatch {
            declared: package.recipient,
            derived,
        });
    }

    Ok(predicate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use handover_core::TokenBinding;
    use handover_test_fixtures::{mint_unmasked, pending_package_to, secret};

    fn pending_to_masked_bob() -> (TokenArtifact, SigningSecret, ByteInput) {
        let alice = secret("alice");
        let artifact = mint_unmasked(&alice, "token-1");
        let bob = secret("bob");
        let nonce = ByteInput::TextToHash("bob nonce".into());
        let binding = TokenBinding {
            token_id: artifact.token.genesis.token_id,
            token_type: artifact.token.genesis.token_type,
        };
        let bob_address =
            Predicate::derive_masked(&bob, nonce.resolve()).address(&binding);
        let pending = pending_package_to(&artifact, &alice, &bob_address);
        (pending, bob, nonce)
    }

    #[test]
    fn correct_secret_and_nonce_resolve() {
        let (pending, bob, nonce) = pending_to_masked_bob();
        let predicate = resolve_recipient(&pending, &bob, Some(&nonce)).unwrap();
        assert!(matches!(predicate, Predicate::Masked { .. }));
    }

    #[test]
    fn wrong_secret_is_an_address_mismatch() {
        let (pending, _, nonce) = pending_to_masked_bob();
        let err = resolve_recipient(&pending, &secret("mallory"), Some(&nonce)).unwrap_err();
        assert!(matches!(err, EngineError::AddressMismatch { .. }));
    }

    #[test]
    fn wrong_nonce_is_an_address_mismatch() {
        let (pending, bob, _) = pending_to_masked_bob();
        let wrong = ByteInput::TextToHash("wrong nonce".into());
        let err = resolve_recipient(&pending, &bob, Some(&wrong)).unwrap_err();
        assert!(matches!(err, EngineError::AddressMismatch { .. }));
    }

    #[test]
    fn missing_nonce_for_masked_recipient_mismatches() {
        let (pending, bob, _) = pending_to_masked_bob();
        let err = resolve_recipient(&pending, &bob, None).unwrap_err();
        assert!(matches!(err, EngineError::AddressMismatch { .. }));
    }

    #[test]
    fn hex_nonce_resolves_to_exact_bytes() {
        let alice = secret("alice");
        let artifact = mint_unmasked(&alice, "token-1");
        let bob = secret("bob");
        let hex_nonce = "ab".repeat(32);
        let input = ByteInput::parse(&hex_nonce);
        let binding = TokenBinding {
            token_id: artifact.token.genesis.token_id,
            token_type: artifact.token.genesis.token_type,
        };
        let address = Predicate::derive_masked(&bob, input.resolve()).address(&binding);
        let pending = pending_package_to(&artifact, &alice, &address);

        assert!(resolve_recipient(&pending, &bob, Some(&input)).is_ok());

        // The same characters treated as text derive a different address.
        let as_text = ByteInput::TextToHash(hex_nonce);
        assert!(resolve_recipient(&pending, &bob, Some(&as_text)).is_err());
    }
}
