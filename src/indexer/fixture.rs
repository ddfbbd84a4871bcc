//! In-memory indexer (for testing/local development)
//!
//! Holds proposal rows, decision deposits and tips, and answers the gateway
//! queries the way the GraphQL indexer would. Addresses are compared as raw
//! strings, like the real indexer does.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use super::{IndexerError, IndexerGateway, Interaction, InteractionHistory, InteractionQuery};
use crate::types::{PostId, ProposalFact, ProposalKind};

#[derive(Debug, Clone)]
struct FixtureProposal {
    network: String,
    id: PostId,
    kind: ProposalKind,
    fact: ProposalFact,
}

#[derive(Debug, Clone)]
struct FixtureDeposit {
    network: String,
    proposal: PostId,
    depositor: String,
    proposer: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct FixtureTip {
    network: String,
    proposal: PostId,
    tipper: String,
    payee: String,
    created_at: DateTime<Utc>,
}

/// In-memory [`IndexerGateway`]
#[derive(Default)]
pub struct FixtureIndexer {
    proposals: RwLock<Vec<FixtureProposal>>,
    deposits: RwLock<Vec<FixtureDeposit>>,
    tips: RwLock<Vec<FixtureTip>>,
    unavailable: AtomicBool,
}

impl FixtureIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a proposal with its proposer
    pub fn add_proposal(
        &self,
        network: &str,
        id: PostId,
        kind: ProposalKind,
        proposer: &str,
        created_at: DateTime<Utc>,
    ) {
        let fact = ProposalFact {
            index: numeric(&id),
            hash: hash(&id),
            proposer: Some(proposer.to_string()),
            payee: None,
            reward: None,
            created_at,
        };
        self.push_proposal(network, id, kind, fact);
    }

    /// Register a tip proposal; `payee`/`reward` may be omitted to model incomplete rows
    pub fn add_tip_proposal(
        &self,
        network: &str,
        id: PostId,
        payee: Option<&str>,
        reward: Option<u128>,
        created_at: DateTime<Utc>,
    ) {
        let fact = ProposalFact {
            index: numeric(&id),
            hash: hash(&id),
            proposer: None,
            payee: payee.map(str::to_string),
            reward,
            created_at,
        };
        self.push_proposal(network, id, ProposalKind::Tip, fact);
    }

    /// Record a decision deposit by `depositor` on proposal `id`, owned by `proposer`
    pub fn add_decision_deposit(
        &self,
        network: &str,
        id: PostId,
        depositor: &str,
        proposer: &str,
        created_at: DateTime<Utc>,
    ) {
        write_lock(&self.deposits).push(FixtureDeposit {
            network: network.to_string(),
            proposal: id,
            depositor: depositor.to_string(),
            proposer: proposer.to_string(),
            created_at,
        });
    }

    /// Record `tipper`'s tip on tip proposal `id`, paying `payee`
    pub fn add_tip(
        &self,
        network: &str,
        id: PostId,
        tipper: &str,
        payee: &str,
        created_at: DateTime<Utc>,
    ) {
        write_lock(&self.tips).push(FixtureTip {
            network: network.to_string(),
            proposal: id,
            tipper: tipper.to_string(),
            payee: payee.to_string(),
            created_at,
        });
    }

    /// Make every query fail with a retryable transport error
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn push_proposal(&self, network: &str, id: PostId, kind: ProposalKind, fact: ProposalFact) {
        write_lock(&self.proposals).push(FixtureProposal {
            network: network.to_string(),
            id,
            kind,
            fact,
        });
    }

    fn check_available(&self) -> Result<(), IndexerError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(IndexerError::Transport("fixture indexer unavailable".to_string()));
        }
        Ok(())
    }

    fn find(&self, network: &str, id: &PostId, kind: ProposalKind) -> Option<ProposalFact> {
        read_lock(&self.proposals)
            .iter()
            .find(|p| p.network == network && &p.id == id && p.kind == kind)
            .map(|p| p.fact.clone())
    }
}

fn numeric(id: &PostId) -> Option<i64> {
    match id {
        PostId::Numeric(n) => Some(*n),
        PostId::Hash(_) => None,
    }
}

fn hash(id: &PostId) -> Option<String> {
    match id {
        PostId::Numeric(_) => None,
        PostId::Hash(h) => Some(h.clone()),
    }
}

fn read_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn summarize(mut matches: Vec<DateTime<Utc>>) -> InteractionHistory {
    matches.sort();
    InteractionHistory {
        count: matches.len() as u64,
        earliest_at: matches.first().copied(),
    }
}

#[async_trait::async_trait]
impl IndexerGateway for FixtureIndexer {
    async fn proposal_origin(
        &self,
        network: &str,
        index: &PostId,
        kind: ProposalKind,
    ) -> Result<Option<ProposalFact>, IndexerError> {
        self.check_available()?;
        Ok(self.find(network, index, kind))
    }

    async fn tip_details(
        &self,
        network: &str,
        index: &PostId,
        kind: ProposalKind,
    ) -> Result<Option<ProposalFact>, IndexerError> {
        self.check_available()?;
        Ok(self.find(network, index, kind))
    }

    async fn interaction_history(
        &self,
        network: &str,
        query: &InteractionQuery,
    ) -> Result<InteractionHistory, IndexerError> {
        self.check_available()?;

        let included = |id: &PostId| query.excluding.as_ref() != Some(id);

        let matches: Vec<DateTime<Utc>> = match query.interaction {
            Interaction::ForeignDecisionDeposit => read_lock(&self.deposits)
                .iter()
                .filter(|d| d.network == network && d.depositor == query.actor)
                .filter(|d| d.proposer != query.actor)
                .filter(|d| query.counterpart.as_ref().map_or(true, |c| &d.proposer == c))
                .filter(|d| included(&d.proposal))
                .map(|d| d.created_at)
                .collect(),
            Interaction::TipGiven => read_lock(&self.tips)
                .iter()
                .filter(|t| t.network == network && t.tipper == query.actor)
                .filter(|t| query.counterpart.as_ref().map_or(true, |c| &t.payee == c))
                .filter(|t| included(&t.proposal))
                .map(|t| t.created_at)
                .collect(),
        };

        Ok(summarize(matches))
    }
}
