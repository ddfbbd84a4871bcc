//! Reward schedule
//!
//! Two tables: a flat reward per created post category, and a tiered table
//! `EventKind → TierBracket → points` for interactions whose value depends on
//! history. The schedule is validated for completeness when built, so
//! processors never meet a hole at runtime.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::TierBracket;
use crate::types::{EventKind, ProposalKind, ReputeError, Result};

/// Event kinds whose reward depends on a tier
const TIERED_EVENTS: [EventKind; 2] = [EventKind::DecisionDepositPlaced, EventKind::Tipped];

/// Flat-reward category of a newly created post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreationCategory {
    /// Referenda, motions and every other post type
    Proposal,
    Bounty,
    ChildBounty,
    Tip,
}

impl CreationCategory {
    pub const ALL: [CreationCategory; 4] = [
        CreationCategory::Proposal,
        CreationCategory::Bounty,
        CreationCategory::ChildBounty,
        CreationCategory::Tip,
    ];
}

impl From<ProposalKind> for CreationCategory {
    fn from(kind: ProposalKind) -> Self {
        match kind {
            ProposalKind::Bounty => Self::Bounty,
            ProposalKind::ChildBounty => Self::ChildBounty,
            ProposalKind::Tip => Self::Tip,
            _ => Self::Proposal,
        }
    }
}

/// Validated reward tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSchedule")]
pub struct RewardSchedule {
    creation: BTreeMap<CreationCategory, i64>,
    tiered: BTreeMap<EventKind, BTreeMap<TierBracket, i64>>,
}

#[derive(Deserialize)]
struct RawSchedule {
    creation: BTreeMap<CreationCategory, i64>,
    tiered: BTreeMap<EventKind, BTreeMap<TierBracket, i64>>,
}

impl TryFrom<RawSchedule> for RewardSchedule {
    type Error = ReputeError;

    fn try_from(raw: RawSchedule) -> Result<Self> {
        Self::new(raw.creation, raw.tiered)
    }
}

impl RewardSchedule {
    /// Build a schedule, rejecting missing categories or brackets
    pub fn new(
        creation: BTreeMap<CreationCategory, i64>,
        tiered: BTreeMap<EventKind, BTreeMap<TierBracket, i64>>,
    ) -> Result<Self> {
        for category in CreationCategory::ALL {
            if !creation.contains_key(&category) {
                return Err(ReputeError::Config(format!(
                    "reward schedule has no creation reward for {:?}",
                    category
                )));
            }
        }

        for event in tiered.keys() {
            if !TIERED_EVENTS.contains(event) {
                return Err(ReputeError::Config(format!(
                    "{} is not a tiered event",
                    event
                )));
            }
        }

        for event in TIERED_EVENTS {
            let brackets = tiered.get(&event).ok_or_else(|| {
                ReputeError::Config(format!("reward schedule has no tiers for {}", event))
            })?;
            for bracket in TierBracket::ALL {
                if !brackets.contains_key(&bracket) {
                    return Err(ReputeError::Config(format!(
                        "reward schedule for {} is missing the {} bracket",
                        event, bracket
                    )));
                }
            }
        }

        Ok(Self { creation, tiered })
    }

    /// Load a schedule from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ReputeError::Config(format!("cannot read reward schedule {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| ReputeError::Config(format!("invalid reward schedule: {}", e)))
    }

    /// Flat reward for creating a post of this kind
    pub fn creation_reward(&self, kind: ProposalKind) -> i64 {
        self.creation
            .get(&CreationCategory::from(kind))
            .copied()
            .unwrap_or_default()
    }

    /// Tiered reward, `None` for events that are not tiered
    pub fn tiered_reward(&self, event: EventKind, bracket: TierBracket) -> Option<i64> {
        self.tiered.get(&event).and_then(|b| b.get(&bracket)).copied()
    }
}

impl Default for RewardSchedule {
    fn default() -> Self {
        let creation = BTreeMap::from([
            (CreationCategory::Proposal, 5),
            (CreationCategory::Bounty, 5),
            (CreationCategory::ChildBounty, 3),
            (CreationCategory::Tip, 1),
        ]);

        let tiered = BTreeMap::from([
            (
                EventKind::DecisionDepositPlaced,
                BTreeMap::from([
                    (TierBracket::First, 2),
                    (TierBracket::Second, 3),
                    (TierBracket::ThirdOrMore, 5),
                ]),
            ),
            (
                EventKind::Tipped,
                BTreeMap::from([
                    (TierBracket::First, 1),
                    (TierBracket::Second, 2),
                    (TierBracket::ThirdOrMore, 3),
                ]),
            ),
        ]);

        Self { creation, tiered }
    }
}
