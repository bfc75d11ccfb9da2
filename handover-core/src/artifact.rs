//! The persisted token artifact.
//!
//! This is the JSON document a holder keeps on disk and hands to a recipient
//! over any out-of-band channel. It is the token itself plus, while a
//! transfer is in flight, a PENDING offline package. The `offlineTransfer`
//! section is present iff the status is PENDING; a successful receive
//! removes it and flips the status to CONFIRMED.

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::commitment::TransferCommitment;
use crate::error::Result;
use crate::token::Token;

/// Current artifact schema version.
pub const ARTIFACT_VERSION: u32 = 1;

/// Transfer lifecycle status of an artifact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferStatus {
    /// An offline package is attached and not yet consumed.
    Pending,
    /// No transfer is in flight; the last receive completed.
    Confirmed,
}

/// The self-contained offline transfer package.
///
/// Built by the sender with no network contact and consumed exactly once by
/// a successful receive.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfflinePackage {
    /// Address of the sending (current) owner.
    pub sender: Address,
    /// Declared recipient address.
    pub recipient: Address,
    /// Network the commitment targets.
    pub network: String,
    /// Optional message from the sender.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// The pre-signed transfer commitment.
    pub commitment: TransferCommitment,
    /// Canonical serialized form of the commitment, as handed off.
    #[serde(rename = "commitmentData")]
    pub commitment_data: String,
}

/// The persisted artifact: token fields plus transfer status and, while
/// PENDING, the offline package.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenArtifact {
    /// Artifact schema version.
    pub version: u32,
    /// Token fields (genesis, state, transactions) at the top level.
    #[serde(flatten)]
    pub token: Token,
    /// Transfer lifecycle status.
    pub status: TransferStatus,
    /// The in-flight offline package; present iff status is PENDING.
    #[serde(
        rename = "offlineTransfer",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub offline_transfer: Option<OfflinePackage>,
}

impl TokenArtifact {
    /// Wrap a token with no transfer in flight.
    pub fn confirmed(token: Token) -> Self {
        Self {
            version: ARTIFACT_VERSION,
            token,
            status: TransferStatus::Confirmed,
            offline_transfer: None,
        }
    }

    /// Parse an artifact from its JSON form.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to the canonical pretty-printed JSON form.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Whether the declared status is consistent with the package section.
    pub fn status_is_consistent(&self) -> bool {
        match self.status {
            TransferStatus::Pending => self.offline_transfer.is_some(),
            TransferStatus::Confirmed => self.offline_transfer.is_none(),
        }
    }
}
