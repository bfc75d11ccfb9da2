//! Commitment submission and proof polling.
//!
//! The polling loop is the only retry construct in the engine: fixed
//! interval, hard wall-clock deadline, no backoff. It is modeled as an
//! explicit state machine whose transitions are driven only by polling
//! responses; a proof may be structurally present but semantically
//! incomplete while ledger finalization is in progress, and the loop keeps
//! waiting until both the authenticator and the transaction hash are
//! populated.

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use handover_core::{InclusionProof, RequestId, TransferCommitment};

use crate::aggregator::{AggregatorClient, SubmitStatus};
use crate::error::{EngineError, Result};

/// State of the submission/polling machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollState {
    /// Commitment accepted; no poll has answered yet.
    Submitted,
    /// The ledger has nothing recorded for the request id (404).
    ProofAbsent,
    /// A proof exists but finalization has not populated it yet.
    ProofIncomplete,
    /// Authenticator and transaction hash are both populated.
    ProofComplete,
    /// The wall-clock bound elapsed without a complete proof.
    TimedOut,
}

/// Classify a polling response.
pub fn classify_response(proof: Option<&InclusionProof>) -> PollState {
    match proof {
        None => PollState::ProofAbsent,
        Some(p) if p.is_complete() => PollState::ProofComplete,
        Some(_) => PollState::ProofIncomplete,
    }
}

/// Submit the commitment once, retrying only opaque transient failures
/// within the given deadline.
///
/// `REQUEST_ID_EXISTS` means someone already submitted this exact
/// commitment; that is terminal for the current attempt rather than papered
/// over, since masking it could hide a real double-spend.
pub async fn submit_commitment(
    client: &dyn AggregatorClient,
    commitment: &TransferCommitment,
    interval: Duration,
    deadline: Instant,
) -> Result<()> {
    let request_id = commitment.request_id();
    loop {
        match client.submit_commitment(commitment).await {
            Ok(SubmitStatus::Success) => {
                info!(%request_id, "commitment submitted");
                return Ok(());
            }
            Ok(SubmitStatus::RequestIdExists) => {
                return Err(EngineError::DuplicateSubmission(request_id.to_hex()));
            }
            Ok(SubmitStatus::Other(status)) => {
                warn!(%request_id, %status, "aggregator returned transient status");
            }
            Err(EngineError::Network(reason)) => {
                warn!(%request_id, %reason, "submission attempt failed");
            }
            Err(other) => return Err(other),
        }
        if Instant::now() + interval > deadline {
            return Err(EngineError::Network(
                "submission did not succeed within the polling bound".into(),
            ));
        }
        sleep(interval).await;
    }
}

/// Poll for a complete inclusion proof at a fixed interval until `deadline`.
///
/// The deadline is shared with the submission phase, so submission retries
/// and polling together honor one overall bound; `timeout` is that
/// configured bound, reported on expiry. Transient fetch errors are retried
/// within the bound. An asymmetric proof (one of authenticator/transaction
/// hash populated without the other) is a fatal validation error, never
/// handed downstream. Exhausting the deadline yields
/// [`EngineError::Timeout`], which leaves the artifact PENDING and
/// retryable.
pub async fn wait_for_proof(
    client: &dyn AggregatorClient,
    request_id: &RequestId,
    interval: Duration,
    deadline: Instant,
    timeout: Duration,
) -> Result<InclusionProof> {
    let mut state = PollState::Submitted;

    loop {
        match client.inclusion_proof(request_id).await {
            Ok(response) => {
                if let Some(proof) = &response {
                    proof.check_symmetry().map_err(|e| {
                        EngineError::Validation(format!("aggregator returned {e}"))
                    })?;
                }
                state = classify_response(response.as_ref());
                debug!(%request_id, ?state, "poll iteration");
                if let (PollState::ProofComplete, Some(proof)) = (state, response) {
                    return Ok(proof);
                }
            }
            Err(EngineError::Network(reason)) => {
                warn!(%request_id, %reason, "proof poll failed; retrying within bound");
            }
            Err(other) => return Err(other),
        }

        if Instant::now() + interval > deadline {
            debug!(%request_id, previous = ?state, "polling bound exhausted");
            return Err(EngineError::Timeout(timeout));
        }
        sleep(interval).await;
    }
}
