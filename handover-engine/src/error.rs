//! Engine error taxonomy.
//!
//! The ordering guarantee behind this taxonomy: local, offline checks always
//! run before any network call, so `Validation`, `AddressFormat` and
//! `AddressMismatch` are raised without a round-trip. `DoubleSpend` and
//! `Integrity` can only arise after the network answered. `Timeout` leaves
//! the artifact untouched and PENDING, so the attempt may be retried later.

use std::time::Duration;

use handover_core::Address;
use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors produced by the transfer engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed or inconsistent package, artifact or proof. Fatal,
    /// raised before any network contact.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Malformed destination or recipient address, rejected before any
    /// cryptography runs.
    #[error("malformed address: {0}")]
    AddressFormat(String),

    /// The supplied secret (and nonce) does not derive the package's
    /// declared recipient address. Fatal, raised before any network call.
    #[error("derived address {derived} does not match declared recipient {declared}")]
    AddressMismatch {
        declared: Address,
        derived: Address,
    },

    /// The source state was already consumed by a competing transaction.
    /// Raised by the pre-submission spent check (naming the current owner)
    /// or by the post-submission transaction-hash cross-check (lost race).
    #[error("source state already spent{}", fmt_owner(.current_owner))]
    DoubleSpend {
        /// Current owner, when the network names one.
        current_owner: Option<Address>,
    },

    /// The proof's attested source-state hash disagrees with the locally
    /// computed one. Not a normal double-spend: it indicates a Byzantine or
    /// buggy network and is escalated accordingly.
    #[error("ledger integrity violation: {0}")]
    Integrity(String),

    /// The aggregator already holds this exact commitment. Terminal for the
    /// current attempt; the correct interpretation is ambiguous without
    /// further proof inspection, so it is never silently retried.
    #[error("commitment for request id {0} was already submitted")]
    DuplicateSubmission(String),

    /// Network or aggregator failure. Fatal to this attempt, retryable
    /// later: the PENDING package is preserved until mutation.
    #[error("aggregator request failed: {0}")]
    Network(String),

    /// The inclusion proof did not become complete within the polling bound.
    /// Retryable; the artifact remains PENDING.
    #[error("timed out after {0:?} waiting for a complete inclusion proof")]
    Timeout(Duration),
}

fn fmt_owner(owner: &Option<Address>) -> String {
    match owner {
        Some(addr) => format!("; current owner is {addr}"),
        None => "; a competing transaction won the race".into(),
    }
}

impl From<reqwest::Error> for EngineError {
    fn from(err: reqwest::Error) -> Self {
        EngineError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Validation(format!("malformed JSON: {err}"))
    }
}

impl From<handover_core::CoreError> for EngineError {
    fn from(err: handover_core::CoreError) -> Self {
        match err {
            handover_core::CoreError::AddressFormat(msg) => EngineError::AddressFormat(msg),
            other => EngineError::Validation(other.to_string()),
        }
    }
}
