//! Proposal creation: a flat reward per post category

use tracing::debug;

use super::{canonical, Award, ProcessOutcome, ReputationProcessor};
use crate::activity::{ActivityKind, ActivityRecord};
use crate::guard::DedupKey;
use crate::rewards::CreationCategory;
use crate::types::{EventKind, ProposalCreated, ReputeError, Result};

impl ReputationProcessor {
    pub(super) async fn proposal_created(&self, event: &ProposalCreated) -> Result<ProcessOutcome> {
        let proposer = canonical(&event.proposer)?;

        let origin = self
            .indexer
            .proposal_origin(&event.network, &event.proposal_index, event.proposal_kind)
            .await?
            .ok_or_else(|| {
                ReputeError::NotFound("failed to fetch proposal creation timestamp".to_string())
            })?;

        let category = CreationCategory::from(event.proposal_kind);
        let delta = self.schedule.creation_reward(event.proposal_kind);
        debug!(category = ?category, delta, "Creation reward resolved");

        self.commit(Award {
            key: DedupKey {
                network: event.network.clone(),
                event: EventKind::ProposalCreated,
                proposal_kind: event.proposal_kind,
                post_id: event.proposal_index.clone(),
                actor: proposer.clone(),
            },
            record: ActivityRecord {
                by: proposer,
                network: event.network.clone(),
                post_id: event.proposal_index.clone(),
                post_type: event.proposal_kind,
                kind: ActivityKind::from(category),
                created_at: origin.created_at,
            },
            delta,
            tier: None,
        })
        .await
    }
}
