//! Data model and local cryptography for offline ownership-token transfers.
//!
//! This crate defines everything the transfer engine computes locally:
//! domain-separated hashing, owner secrets and signing keys, ownership
//! predicates and their one-way addresses, signed transfer commitments,
//! inclusion proofs with trust-base verification, and the persisted token
//! artifact handed between holders.
//!
//! Submission, polling and the double-spend checks that drive these types
//! against an aggregator live in `handover-engine`.

pub mod address;
pub mod artifact;
pub mod commitment;
pub mod error;
pub mod hash;
pub mod keys;
pub mod predicate;
pub mod proof;
pub mod token;

pub use address::Address;
pub use artifact::{OfflinePackage, TokenArtifact, TransferStatus, ARTIFACT_VERSION};
pub use commitment::{RequestId, TransferCommitment, TransferPayload};
pub use error::{CoreError, Result};
pub use hash::{hash_text_input, ByteInput, DataHash, DomainHasher};
pub use keys::{PublicKey, SignatureBytes, SigningSecret};
pub use predicate::{Predicate, TokenBinding};
pub use proof::{
    Authenticator, InclusionProof, LedgerCertificate, MerklePathStep, QuorumSignature, TrustBase,
};
pub use token::{
    hash_state_data, mint_source_state_hash, Token, TokenGenesis, TokenState, TokenTransaction,
};
