//! Chain indexer gateway
//!
//! The only network I/O on the processing path. Three query shapes are
//! needed by the processors:
//!
//! - proposer + creation time of a proposal
//! - payee + reward + creation time of a tip
//! - count (and earliest row) of an account's prior qualifying interactions,
//!   optionally narrowed to one counterpart
//!
//! The gateway has no retry policy of its own; errors carry a retryable flag
//! and the worker decides whether to redeliver.

pub mod fixture;
pub mod graphql;
pub mod queries;

use chrono::{DateTime, Utc};

use crate::types::{PostId, ProposalFact, ProposalKind};

pub use fixture::FixtureIndexer;
pub use graphql::{GraphQlIndexer, GraphQlIndexerConfig};

/// Kind of historical interaction counted for tiering and uniqueness checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    /// Decision deposits placed on referenda proposed by someone else
    ForeignDecisionDeposit,
    /// Tips endorsed by the actor
    TipGiven,
}

/// Parameters for [`IndexerGateway::interaction_history`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionQuery {
    pub interaction: Interaction,
    /// Raw address of the acting account, as the indexer stores it
    pub actor: String,
    /// Restrict to interactions with this counterpart (e.g. a tip payee)
    pub counterpart: Option<String>,
    /// Leave out the interaction on this proposal (the one being processed)
    pub excluding: Option<PostId>,
}

impl InteractionQuery {
    pub fn foreign_decision_deposits(depositor: &str) -> Self {
        Self {
            interaction: Interaction::ForeignDecisionDeposit,
            actor: depositor.to_string(),
            counterpart: None,
            excluding: None,
        }
    }

    pub fn tips_given(tipper: &str) -> Self {
        Self {
            interaction: Interaction::TipGiven,
            actor: tipper.to_string(),
            counterpart: None,
            excluding: None,
        }
    }

    pub fn with_counterpart(mut self, counterpart: &str) -> Self {
        self.counterpart = Some(counterpart.to_string());
        self
    }

    pub fn excluding(mut self, proposal: &PostId) -> Self {
        self.excluding = Some(proposal.clone());
        self
    }
}

/// Count of matching interactions plus the oldest match's timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InteractionHistory {
    pub count: u64,
    pub earliest_at: Option<DateTime<Utc>>,
}

/// Read-only access to indexed chain facts
#[async_trait::async_trait]
pub trait IndexerGateway: Send + Sync {
    /// Proposer and creation time of a proposal
    async fn proposal_origin(
        &self,
        network: &str,
        index: &PostId,
        kind: ProposalKind,
    ) -> Result<Option<ProposalFact>, IndexerError>;

    /// Payee, reward and creation time of a tip proposal
    async fn tip_details(
        &self,
        network: &str,
        index: &PostId,
        kind: ProposalKind,
    ) -> Result<Option<ProposalFact>, IndexerError>;

    /// Count prior interactions of `query.actor`
    async fn interaction_history(
        &self,
        network: &str,
        query: &InteractionQuery,
    ) -> Result<InteractionHistory, IndexerError>;
}

/// Errors from the indexer gateway
#[derive(Debug, Clone, thiserror::Error)]
pub enum IndexerError {
    #[error("No indexer endpoint configured for network '{0}'")]
    UnknownNetwork(String),

    #[error("{query} on {network} timed out")]
    Timeout { network: String, query: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("GraphQL errors: {}", .0.join("; "))]
    GraphQl(Vec<String>),

    #[error("Failed to decode indexer response: {0}")]
    Decode(String),
}

impl IndexerError {
    /// Whether the same query may succeed if issued again later
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Transport(_) => true,
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            Self::UnknownNetwork(_) | Self::GraphQl(_) | Self::Decode(_) => false,
        }
    }
}
