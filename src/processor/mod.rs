//! Reputation event processors
//!
//! Each event runs through the same stages:
//!
//! ```text
//! fetch context → check eligibility → compute tier → claim → record → apply delta
//! ```
//!
//! Runs are stateless and every stage is a sequential await. A failure aborts
//! the run without undoing earlier stages, with one exception: a claim whose
//! activity write failed is released so a redelivery starts clean. A claim
//! whose ledger write failed is kept, otherwise the redelivery would append a
//! second activity.

mod decision_deposit;
mod proposal_created;
mod tipped;

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::activity::{ActivityKind, ActivityRecord, ActivityRecorder};
use crate::address::{canonicalize, Address};
use crate::guard::{DedupKey, EventGuard};
use crate::indexer::IndexerGateway;
use crate::ledger::ReputationLedger;
use crate::rewards::{RewardSchedule, TierBracket};
use crate::types::{EventKind, ReputationEvent, ReputeError, Result};

/// Why an event produced no writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Decision deposit on the depositor's own proposal
    SelfDealing,
    /// Tipper already tipped this payee before
    RepeatTip,
    /// The same event was already claimed by an earlier delivery
    AlreadyProcessed,
}

/// Result of processing one event
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessOutcome {
    Applied {
        activity_id: String,
        address: Address,
        activity: ActivityKind,
        delta: i64,
        /// `None` for flat creation rewards
        tier: Option<TierBracket>,
    },
    Skipped(SkipReason),
}

impl ProcessOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Runs events against the indexer and the three stores
#[derive(Clone)]
pub struct ReputationProcessor {
    indexer: Arc<dyn IndexerGateway>,
    recorder: Arc<dyn ActivityRecorder>,
    ledger: Arc<dyn ReputationLedger>,
    guard: Arc<dyn EventGuard>,
    schedule: Arc<RewardSchedule>,
}

/// Everything decided before the first write
struct Award {
    key: DedupKey,
    record: ActivityRecord,
    delta: i64,
    tier: Option<TierBracket>,
}

impl ReputationProcessor {
    pub fn new(
        indexer: Arc<dyn IndexerGateway>,
        recorder: Arc<dyn ActivityRecorder>,
        ledger: Arc<dyn ReputationLedger>,
        guard: Arc<dyn EventGuard>,
        schedule: Arc<RewardSchedule>,
    ) -> Self {
        Self {
            indexer,
            recorder,
            ledger,
            guard,
            schedule,
        }
    }

    pub fn schedule(&self) -> &RewardSchedule {
        &self.schedule
    }

    /// Process one event
    pub async fn process(&self, event: &ReputationEvent) -> Result<ProcessOutcome> {
        debug!(
            network = %event.network(),
            event = %event.kind(),
            post_id = %event.post_id(),
            "Processing event"
        );

        match event {
            ReputationEvent::ProposalCreated(e) => self.proposal_created(e).await,
            ReputationEvent::DecisionDepositPlaced(e) => self.decision_deposit_placed(e).await,
            ReputationEvent::Tipped(e) => self.tipped(e).await,
        }
    }

    /// Tiered reward; the schedule is validated at load so a hole is a config bug
    fn tiered_reward(&self, event: EventKind, tier: TierBracket) -> Result<i64> {
        self.schedule.tiered_reward(event, tier).ok_or_else(|| {
            ReputeError::Config(format!("no {} reward for {}", tier, event))
        })
    }

    /// Claim, record, apply
    async fn commit(&self, award: Award) -> Result<ProcessOutcome> {
        let Award {
            key,
            record,
            delta,
            tier,
        } = award;

        if !self.guard.claim(&key).await? {
            debug!(key = %key, "Skipping duplicate delivery");
            return Ok(ProcessOutcome::Skipped(SkipReason::AlreadyProcessed));
        }

        let address = record.by.clone();
        let activity = record.kind;

        let activity_id = match self.recorder.record(record).await {
            Ok(id) => id,
            Err(e) => {
                if let Err(release_err) = self.guard.release(&key).await {
                    warn!(key = %key, error = %release_err, "Failed to release event claim");
                }
                return Err(e);
            }
        };

        self.ledger.apply_delta(&address, delta).await?;

        info!(
            network = %key.network,
            event = %key.event,
            post_id = %key.post_id,
            address = %address,
            delta,
            tier = tier.map(|t| t.as_str()).unwrap_or("flat"),
            activity_id = %activity_id,
            "Reputation applied"
        );

        Ok(ProcessOutcome::Applied {
            activity_id,
            address,
            activity,
            delta,
            tier,
        })
    }
}

/// Canonicalize a raw account or fail with `InvalidAddress`
fn canonical(raw: &str) -> Result<Address> {
    canonicalize(raw).ok_or_else(|| ReputeError::InvalidAddress(raw.to_string()))
}
