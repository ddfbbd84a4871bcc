//! Reward tiers and the static reward schedule

mod schedule;

pub use schedule::{CreationCategory, RewardSchedule};

use serde::{Deserialize, Serialize};
use std::fmt;

/// How many times an account already performed a qualifying action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierBracket {
    First,
    Second,
    ThirdOrMore,
}

impl TierBracket {
    pub const ALL: [TierBracket; 3] = [TierBracket::First, TierBracket::Second, TierBracket::ThirdOrMore];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Second => "second",
            Self::ThirdOrMore => "third_or_more",
        }
    }
}

impl fmt::Display for TierBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a prior interaction count to its bracket
pub fn resolve_tier(prior_count: u64) -> TierBracket {
    match prior_count {
        0 => TierBracket::First,
        1 => TierBracket::Second,
        _ => TierBracket::ThirdOrMore,
    }
}
