//! Tokens: genesis, transaction history and current state.
//!
//! A token is an immutable genesis transaction plus an ordered history of
//! finalized transfers and the current ownership state. Identity and type are
//! fixed at genesis; the transaction count only ever grows.

use serde::{Deserialize, Serialize};

use crate::commitment::{RequestId, TransferCommitment};
use crate::error::{CoreError, Result};
use crate::hash::{DataHash, DomainHasher, DOMAIN_MINT, DOMAIN_STATE, DOMAIN_STATE_DATA};
use crate::predicate::{Predicate, TokenBinding};
use crate::proof::InclusionProof;

/// Hash opaque state data for commitment comparison.
pub fn hash_state_data(data: &[u8]) -> DataHash {
    DomainHasher::new(DOMAIN_STATE_DATA).update(data).finalize()
}

/// The synthetic source state a mint transaction consumes.
///
/// Minting has no predecessor state; the ledger slot it occupies is derived
/// from the token identity alone, so a token can only ever be minted once.
pub fn mint_source_state_hash(binding: &TokenBinding) -> DataHash {
    DomainHasher::new(DOMAIN_MINT)
        .update(binding.token_id.as_bytes())
        .update(binding.token_type.as_bytes())
        .finalize()
}

/// A token's current ownership state: predicate plus opaque data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenState {
    /// The locking predicate.
    pub predicate: Predicate,
    /// Opaque state data, hex-encoded on the wire.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "opt_hex_bytes")]
    pub data: Option<Vec<u8>>,
}

impl TokenState {
    /// Build a state after checking the data against the hash the preceding
    /// transaction committed to.
    ///
    /// If a commitment exists the data must be present and hash to exactly
    /// that value; if none exists the data must be absent. Runs before any
    /// state is constructed, so a bad payload never becomes a state.
    pub fn new_checked(
        predicate: Predicate,
        data: Option<Vec<u8>>,
        committed_hash: Option<&DataHash>,
    ) -> Result<Self> {
        match (committed_hash, &data) {
            (None, None) => {}
            (None, Some(_)) => {
                return Err(CoreError::DataHashMismatch {
                    expected: "no committed data".into(),
                    computed: "unsolicited data supplied".into(),
                })
            }
            (Some(expected), None) => {
                return Err(CoreError::DataHashMismatch {
                    expected: expected.to_string(),
                    computed: "no data supplied".into(),
                })
            }
            (Some(expected), Some(bytes)) => {
                let computed = hash_state_data(bytes);
                if computed != *expected {
                    return Err(CoreError::DataHashMismatch {
                        expected: expected.to_string(),
                        computed: computed.to_string(),
                    });
                }
            }
        }
        Ok(Self { predicate, data })
    }

    /// Compute the state hash for a given token binding.
    pub fn hash(&self, binding: &TokenBinding) -> DataHash {
        DomainHasher::new(DOMAIN_STATE)
            .update(self.predicate.reference(binding).as_bytes())
            .update_opt(self.data.as_deref())
            .finalize()
    }
}

/// The immutable genesis record of a token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGenesis {
    /// Token identifier, fixed forever.
    #[serde(rename = "tokenId")]
    pub token_id: DataHash,
    /// Token type, fixed forever.
    #[serde(rename = "tokenType")]
    pub token_type: DataHash,
    /// The mint commitment that created the token.
    pub commitment: TransferCommitment,
    /// Inclusion proof for the mint.
    pub proof: InclusionProof,
}

impl TokenGenesis {
    /// The aggregator request id of the mint.
    pub fn request_id(&self) -> RequestId {
        self.commitment.request_id()
    }
}

/// A finalized transfer: the commitment plus its inclusion proof.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenTransaction {
    pub commitment: TransferCommitment,
    pub proof: InclusionProof,
}

/// A token: genesis, ordered transfer history and current state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub genesis: TokenGenesis,
    #[serde(default)]
    pub transactions: Vec<TokenTransaction>,
    pub state: TokenState,
}

impl Token {
    /// The immutable identity this token's predicates bind to.
    pub fn binding(&self) -> TokenBinding {
        TokenBinding {
            token_id: self.genesis.token_id,
            token_type: self.genesis.token_type,
        }
    }

    /// Number of finalized transfers (genesis excluded).
    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    /// Hash of the current ownership state.
    pub fn current_state_hash(&self) -> DataHash {
        self.state.hash(&self.binding())
    }
}

mod opt_hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(data: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match data {
            Some(bytes) => serializer.serialize_str(&hex::encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value: Option<String> = Option::deserialize(deserializer)?;
        match value {
            Some(s) => hex::decode(&s)
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}
