//! Decision deposits on someone else's proposal, tiered by prior deposits

use chrono::Utc;
use tracing::debug;

use super::{canonical, Award, ProcessOutcome, ReputationProcessor, SkipReason};
use crate::activity::{ActivityKind, ActivityRecord};
use crate::guard::DedupKey;
use crate::indexer::InteractionQuery;
use crate::rewards::resolve_tier;
use crate::types::{DecisionDepositPlaced, EventKind, ReputeError, Result};

impl ReputationProcessor {
    pub(super) async fn decision_deposit_placed(
        &self,
        event: &DecisionDepositPlaced,
    ) -> Result<ProcessOutcome> {
        let depositor = canonical(&event.depositor)?;

        let raw_proposer = self
            .indexer
            .proposal_origin(&event.network, &event.proposal_index, event.proposal_kind)
            .await?
            .and_then(|fact| fact.proposer)
            .ok_or_else(|| ReputeError::NotFound("failed to fetch proposal proposer".to_string()))?;

        if canonical(&raw_proposer)? == depositor {
            debug!(address = %depositor, post_id = %event.proposal_index, "Deposit on own proposal");
            return Ok(ProcessOutcome::Skipped(SkipReason::SelfDealing));
        }

        let history = self
            .indexer
            .interaction_history(
                &event.network,
                &InteractionQuery::foreign_decision_deposits(&event.depositor)
                    .excluding(&event.proposal_index),
            )
            .await?;

        let tier = resolve_tier(history.count);
        let delta = self.tiered_reward(EventKind::DecisionDepositPlaced, tier)?;

        // Activity time is the depositor's earliest foreign deposit, not this one
        let created_at = history.earliest_at.unwrap_or_else(Utc::now);

        self.commit(Award {
            key: DedupKey {
                network: event.network.clone(),
                event: EventKind::DecisionDepositPlaced,
                proposal_kind: event.proposal_kind,
                post_id: event.proposal_index.clone(),
                actor: depositor.clone(),
            },
            record: ActivityRecord {
                by: depositor,
                network: event.network.clone(),
                post_id: event.proposal_index.clone(),
                post_type: event.proposal_kind,
                kind: ActivityKind::DecisionDepositOnForeignProposal,
                created_at,
            },
            delta,
            tier: Some(tier),
        })
        .await
    }
}
