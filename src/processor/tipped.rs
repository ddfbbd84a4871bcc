//! Tips to a payee the tipper never tipped before, tiered by prior tips

use tracing::debug;

use super::{canonical, Award, ProcessOutcome, ReputationProcessor, SkipReason};
use crate::activity::{ActivityKind, ActivityRecord};
use crate::guard::DedupKey;
use crate::indexer::InteractionQuery;
use crate::rewards::resolve_tier;
use crate::types::{EventKind, ReputeError, Result, Tipped};

impl ReputationProcessor {
    pub(super) async fn tipped(&self, event: &Tipped) -> Result<ProcessOutcome> {
        let tipper = canonical(&event.tipper)?;

        let tip = self
            .indexer
            .tip_details(&event.network, &event.proposal_index, event.proposal_kind)
            .await?
            .ok_or_else(|| ReputeError::NotFound("failed to fetch tip".to_string()))?;

        let payee = match (&tip.payee, tip.reward) {
            (Some(payee), Some(_)) => payee.clone(),
            _ => return Err(ReputeError::NotFound("tip payee or reward missing".to_string())),
        };

        let to_payee = self
            .indexer
            .interaction_history(
                &event.network,
                &InteractionQuery::tips_given(&event.tipper)
                    .with_counterpart(&payee)
                    .excluding(&event.proposal_index),
            )
            .await?;

        if to_payee.count > 0 {
            debug!(address = %tipper, payee = %payee, "Payee already tipped");
            return Ok(ProcessOutcome::Skipped(SkipReason::RepeatTip));
        }

        let history = self
            .indexer
            .interaction_history(
                &event.network,
                &InteractionQuery::tips_given(&event.tipper).excluding(&event.proposal_index),
            )
            .await?;

        let tier = resolve_tier(history.count);
        let delta = self.tiered_reward(EventKind::Tipped, tier)?;

        self.commit(Award {
            key: DedupKey {
                network: event.network.clone(),
                event: EventKind::Tipped,
                proposal_kind: event.proposal_kind,
                post_id: event.proposal_index.clone(),
                actor: tipper.clone(),
            },
            record: ActivityRecord {
                by: tipper,
                network: event.network.clone(),
                post_id: event.proposal_index.clone(),
                post_type: event.proposal_kind,
                kind: ActivityKind::TipGiven,
                created_at: tip.created_at,
            },
            delta,
            tier: Some(tier),
        })
        .await
    }
}
