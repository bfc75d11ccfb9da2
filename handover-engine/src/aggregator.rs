//! Aggregator client.
//!
//! The aggregator is the remote gateway to the ledger: it accepts signed
//! transfer commitments, answers spent/unspent queries, and serves inclusion
//! proofs once consensus has recorded a transaction. The trait seam exists so
//! tests can drive the full receive flow against an in-memory ledger.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use handover_core::{Address, DataHash, InclusionProof, RequestId, TransferCommitment};

use crate::error::{EngineError, Result};

/// Outcome of a commitment submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitStatus {
    /// The commitment was accepted (or an identical racing submission with a
    /// different payload already occupies the slot; the proof decides).
    Success,
    /// This exact commitment was already submitted.
    RequestIdExists,
    /// Any other aggregator status; treated as an opaque transient failure.
    Other(String),
}

impl SubmitStatus {
    /// Map a wire status string.
    pub fn from_wire(status: &str) -> Self {
        match status {
            "SUCCESS" => Self::Success,
            "REQUEST_ID_EXISTS" => Self::RequestIdExists,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Spent/unspent status of a source state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpentStatus {
    /// No recorded transaction consumes the state.
    Unspent,
    /// A recorded transaction already consumed the state.
    Spent {
        /// The current owner, when the aggregator names one.
        owner: Option<Address>,
    },
}

/// Client-side view of the aggregator service.
#[async_trait]
pub trait AggregatorClient: Send + Sync {
    /// Submit a commitment for inclusion.
    async fn submit_commitment(&self, commitment: &TransferCommitment) -> Result<SubmitStatus>;

    /// Fetch the inclusion proof for a request id, `None` while the ledger
    /// has nothing recorded yet (HTTP 404).
    async fn inclusion_proof(&self, request_id: &RequestId) -> Result<Option<InclusionProof>>;

    /// Query whether a source state has already been consumed.
    async fn spent_status(&self, state_hash: &DataHash) -> Result<SpentStatus>;
}

/// HTTP aggregator client.
#[derive(Clone, Debug)]
pub struct HttpAggregatorClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    #[serde(rename = "requestId")]
    request_id: String,
    commitment: &'a TransferCommitment,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    status: String,
}

#[derive(Debug, Deserialize)]
struct SpentResponse {
    status: String,
    #[serde(default)]
    owner: Option<Address>,
}

impl HttpAggregatorClient {
    /// Create a client for an aggregator base URL.
    pub fn new(base_url: impl Into<String>, request_timeout: std::time::Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| EngineError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// The aggregator base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl AggregatorClient for HttpAggregatorClient {
    async fn submit_commitment(&self, commitment: &TransferCommitment) -> Result<SubmitStatus> {
        let body = SubmitRequest {
            request_id: commitment.request_id().to_hex(),
            commitment,
        };
        let response = self
            .client
            .post(format!("{}/api/v1/commitments", self.base_url))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(EngineError::Network(format!(
                "submission failed with status {}",
                response.status()
            )));
        }

        let parsed: SubmitResponse = response.json().await?;
        Ok(SubmitStatus::from_wire(&parsed.status))
    }

    async fn inclusion_proof(&self, request_id: &RequestId) -> Result<Option<InclusionProof>> {
        let response = self
            .client
            .get(format!(
                "{}/api/v1/proofs/{}",
                self.base_url,
                request_id.to_hex()
            ))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(EngineError::Network(format!(
                "proof fetch failed with status {}",
                response.status()
            )));
        }

        Ok(Some(response.json().await?))
    }

    async fn spent_status(&self, state_hash: &DataHash) -> Result<SpentStatus> {
        let response = self
            .client
            .get(format!(
                "{}/api/v1/states/{}",
                self.base_url,
                state_hash.to_hex()
            ))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(EngineError::Network(format!(
                "spent-status query failed with status {}",
                response.status()
            )));
        }

        let parsed: SpentResponse = response.json().await?;
        match parsed.status.as_str() {
            "SPENT" => Ok(SpentStatus::Spent {
                owner: parsed.owner,
            }),
            "UNSPENT" => Ok(SpentStatus::Unspent),
            other => Err(EngineError::Network(format!(
                "unrecognized spent status {other:?}"
            ))),
        }
    }
}
