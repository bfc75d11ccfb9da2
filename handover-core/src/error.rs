//! Error types for the core data model.

use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors produced by the core data model and local cryptography.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed or mis-checksummed address string.
    #[error("malformed address: {0}")]
    AddressFormat(String),

    /// Invalid key material.
    #[error("invalid key material: {0}")]
    InvalidKey(String),

    /// Signature verification failed.
    #[error("signature verification failed: {0}")]
    InvalidSignature(String),

    /// An inclusion proof violated the completeness invariant
    /// (authenticator and transaction hash must be both present or both absent).
    #[error("asymmetric inclusion proof: {0}")]
    AsymmetricProof(String),

    /// Recipient data does not hash to the value the preceding transaction
    /// committed to.
    #[error("recipient data hash mismatch: expected {expected}, computed {computed}")]
    DataHashMismatch {
        expected: String,
        computed: String,
    },

    /// Malformed hex input.
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// JSON serialization/deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
