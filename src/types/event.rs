//! Triggering governance events
//!
//! Each event arrives as a flat struct of primitives: network name, proposal
//! index (number or `0x` hash), proposal kind and the acting account.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::proposal::{PostId, ProposalKind};

/// Discriminant of a [`ReputationEvent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ProposalCreated,
    DecisionDepositPlaced,
    Tipped,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProposalCreated => "proposal_created",
            Self::DecisionDepositPlaced => "decision_deposit_placed",
            Self::Tipped => "tipped",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A proposal was created by `proposer`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalCreated {
    pub network: String,
    pub proposal_index: PostId,
    pub proposal_kind: ProposalKind,
    pub proposer: String,
}

/// `depositor` placed the decision deposit on a referendum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionDepositPlaced {
    pub network: String,
    pub proposal_index: PostId,
    pub proposal_kind: ProposalKind,
    pub depositor: String,
}

/// `tipper` endorsed a tip proposal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tipped {
    pub network: String,
    pub proposal_index: PostId,
    pub proposal_kind: ProposalKind,
    pub tipper: String,
}

/// Any event the processors handle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ReputationEvent {
    ProposalCreated(ProposalCreated),
    DecisionDepositPlaced(DecisionDepositPlaced),
    Tipped(Tipped),
}

impl ReputationEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::ProposalCreated(_) => EventKind::ProposalCreated,
            Self::DecisionDepositPlaced(_) => EventKind::DecisionDepositPlaced,
            Self::Tipped(_) => EventKind::Tipped,
        }
    }

    pub fn network(&self) -> &str {
        match self {
            Self::ProposalCreated(e) => &e.network,
            Self::DecisionDepositPlaced(e) => &e.network,
            Self::Tipped(e) => &e.network,
        }
    }

    pub fn post_id(&self) -> &PostId {
        match self {
            Self::ProposalCreated(e) => &e.proposal_index,
            Self::DecisionDepositPlaced(e) => &e.proposal_index,
            Self::Tipped(e) => &e.proposal_index,
        }
    }

    /// Raw address of the account being rewarded
    pub fn actor(&self) -> &str {
        match self {
            Self::ProposalCreated(e) => &e.proposer,
            Self::DecisionDepositPlaced(e) => &e.depositor,
            Self::Tipped(e) => &e.tipper,
        }
    }
}

/// Wire envelope for events delivered over NATS
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    /// Producer-assigned id, only used for log correlation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,

    #[serde(flatten)]
    pub event: ReputationEvent,
}

impl EventEnvelope {
    pub fn from_bytes(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }

    pub fn to_bytes(&self) -> Result<bytes::Bytes, serde_json::Error> {
        serde_json::to_vec(self).map(Into::into)
    }
}
