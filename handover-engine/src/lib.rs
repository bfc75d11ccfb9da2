//! Client engine for asynchronous, offline-capable ownership-token transfers.
//!
//! A holder builds a pre-signed transfer commitment fully offline
//! ([`prepare_transfer`]) and hands the resulting package to the recipient
//! over any out-of-band channel. The recipient later finalizes it
//! ([`receive_transfer`]): local validation and the address self-check run
//! first, then the commitment is submitted to the aggregator, an inclusion
//! proof is polled for under a hard deadline, and the returned proof is
//! cross-checked against the locally computed transaction identity. That
//! check is how a lost race against a competing claim on the same source
//! state is detected from locally verifiable data.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod finalize;
pub mod poll;
pub mod receive;
pub mod resolve;
pub mod send;
pub mod spend_check;
pub mod validate;

pub use aggregator::{AggregatorClient, HttpAggregatorClient, SpentStatus, SubmitStatus};
pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use finalize::finalize_receive;
pub use poll::{classify_response, submit_commitment, wait_for_proof, PollState};
pub use receive::{receive_transfer, ReceiveOutcome};
pub use resolve::resolve_recipient;
pub use send::prepare_transfer;
pub use spend_check::{crosscheck_proof, precheck_source_state};
pub use validate::{validate_package, validate_proofs, ValidationReport};
