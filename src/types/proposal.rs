//! Governance proposal types shared by the indexer, processors and stores

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::ReputeError;

/// Governance post type
///
/// Serializes with the store spelling (`referendums_v2`, `bounties`, ...).
/// The indexer uses its own enum names, see [`ProposalKind::indexer_type`];
/// deserialization accepts both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum ProposalKind {
    #[serde(rename = "referendums_v2")]
    ReferendumV2,
    #[serde(rename = "referendums")]
    Referendum,
    #[serde(rename = "democracy_proposals")]
    DemocracyProposal,
    #[serde(rename = "treasury_proposals")]
    TreasuryProposal,
    #[serde(rename = "bounties")]
    Bounty,
    #[serde(rename = "child_bounties")]
    ChildBounty,
    #[serde(rename = "tips")]
    Tip,
    #[serde(rename = "council_motions")]
    CouncilMotion,
    #[serde(rename = "tech_committee_proposals")]
    TechCommitteeProposal,
    #[serde(rename = "fellowship_referendums")]
    FellowshipReferendum,
}

impl ProposalKind {
    pub const ALL: [ProposalKind; 10] = [
        ProposalKind::ReferendumV2,
        ProposalKind::Referendum,
        ProposalKind::DemocracyProposal,
        ProposalKind::TreasuryProposal,
        ProposalKind::Bounty,
        ProposalKind::ChildBounty,
        ProposalKind::Tip,
        ProposalKind::CouncilMotion,
        ProposalKind::TechCommitteeProposal,
        ProposalKind::FellowshipReferendum,
    ];

    /// Store spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReferendumV2 => "referendums_v2",
            Self::Referendum => "referendums",
            Self::DemocracyProposal => "democracy_proposals",
            Self::TreasuryProposal => "treasury_proposals",
            Self::Bounty => "bounties",
            Self::ChildBounty => "child_bounties",
            Self::Tip => "tips",
            Self::CouncilMotion => "council_motions",
            Self::TechCommitteeProposal => "tech_committee_proposals",
            Self::FellowshipReferendum => "fellowship_referendums",
        }
    }

    /// Indexer `ProposalType` enum value
    pub fn indexer_type(&self) -> &'static str {
        match self {
            Self::ReferendumV2 => "ReferendumV2",
            Self::Referendum => "Referendum",
            Self::DemocracyProposal => "DemocracyProposal",
            Self::TreasuryProposal => "TreasuryProposal",
            Self::Bounty => "Bounty",
            Self::ChildBounty => "ChildBounty",
            Self::Tip => "Tip",
            Self::CouncilMotion => "CouncilMotion",
            Self::TechCommitteeProposal => "TechCommitteeProposal",
            Self::FellowshipReferendum => "FellowshipReferendum",
        }
    }
}

impl fmt::Display for ProposalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProposalKind {
    type Err = ReputeError;

    /// Accepts either the store or the indexer spelling.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s || k.indexer_type().eq_ignore_ascii_case(s))
            .ok_or_else(|| ReputeError::BadRequest(format!("Unknown proposal kind: {}", s)))
    }
}

impl TryFrom<String> for ProposalKind {
    type Error = ReputeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Post identifier: numeric index, or the verbatim hash for hash-keyed posts (tips)
///
/// Serialized untagged so stores see a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged, try_from = "RawPostId")]
pub enum PostId {
    Numeric(i64),
    Hash(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPostId {
    Int(i64),
    Str(String),
}

impl TryFrom<RawPostId> for PostId {
    type Error = ReputeError;

    fn try_from(raw: RawPostId) -> Result<Self, Self::Error> {
        match raw {
            RawPostId::Int(n) if n >= 0 => Ok(PostId::Numeric(n)),
            RawPostId::Int(n) => Err(ReputeError::BadRequest(format!(
                "Negative proposal index: {}",
                n
            ))),
            RawPostId::Str(s) => s.parse(),
        }
    }
}

impl FromStr for PostId {
    type Err = ReputeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with("0x") {
            return Ok(PostId::Hash(s.to_string()));
        }
        s.parse::<i64>()
            .ok()
            .filter(|n| *n >= 0)
            .map(PostId::Numeric)
            .ok_or_else(|| ReputeError::BadRequest(format!("Invalid proposal index: {}", s)))
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostId::Numeric(n) => write!(f, "{}", n),
            PostId::Hash(h) => f.write_str(h),
        }
    }
}

/// Proposal row as returned by the indexer
///
/// Each lookup selects a different subset of fields; processors decide which
/// ones are required.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalFact {
    #[serde(default)]
    pub index: Option<i64>,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub proposer: Option<String>,
    #[serde(default)]
    pub payee: Option<String>,
    #[serde(default, deserialize_with = "deserialize_big_uint")]
    pub reward: Option<u128>,
    pub created_at: DateTime<Utc>,
}

/// GraphQL `BigInt` arrives as a decimal string; tolerate plain numbers too.
fn deserialize_big_uint<'de, D>(deserializer: D) -> Result<Option<u128>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BigUint {
        Str(String),
        Num(u64),
    }

    match Option::<BigUint>::deserialize(deserializer)? {
        None => Ok(None),
        Some(BigUint::Num(n)) => Ok(Some(u128::from(n))),
        Some(BigUint::Str(s)) => s
            .trim()
            .parse::<u128>()
            .map(Some)
            .map_err(|e| serde::de::Error::custom(format!("invalid BigInt {:?}: {}", s, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_id_parse() {
        assert_eq!("42".parse::<PostId>().unwrap(), PostId::Numeric(42));
        assert_eq!(
            "0xabc123".parse::<PostId>().unwrap(),
            PostId::Hash("0xabc123".to_string())
        );
        assert!("-1".parse::<PostId>().is_err());
        assert!("forty-two".parse::<PostId>().is_err());
    }

    #[test]
    fn test_post_id_json_shape() {
        assert_eq!(serde_json::to_value(PostId::Numeric(7)).unwrap(), serde_json::json!(7));
        assert_eq!(
            serde_json::to_value(PostId::Hash("0xfeed".into())).unwrap(),
            serde_json::json!("0xfeed")
        );

        // Trigger payloads may carry numeric indexes as strings
        let id: PostId = serde_json::from_str("\"12\"").unwrap();
        assert_eq!(id, PostId::Numeric(12));
        let id: PostId = serde_json::from_str("12").unwrap();
        assert_eq!(id, PostId::Numeric(12));
        assert!(serde_json::from_str::<PostId>("-3").is_err());
    }

    #[test]
    fn test_proposal_kind_spellings() {
        assert_eq!("bounties".parse::<ProposalKind>().unwrap(), ProposalKind::Bounty);
        assert_eq!("ChildBounty".parse::<ProposalKind>().unwrap(), ProposalKind::ChildBounty);
        assert_eq!(
            "referendums_v2".parse::<ProposalKind>().unwrap(),
            ProposalKind::ReferendumV2
        );
        assert!("polls".parse::<ProposalKind>().is_err());

        for kind in ProposalKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_proposal_fact_reward_forms() {
        let fact: ProposalFact = serde_json::from_value(serde_json::json!({
            "hash": "0x01",
            "payee": "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY",
            "reward": "340282366920938463463374607431768211455",
            "createdAt": "2024-03-01T10:00:00.000Z"
        }))
        .unwrap();
        assert_eq!(fact.reward, Some(u128::MAX));
        assert_eq!(fact.proposer, None);

        let fact: ProposalFact = serde_json::from_value(serde_json::json!({
            "index": 3,
            "reward": 1000,
            "createdAt": "2024-03-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(fact.reward, Some(1000));
        assert_eq!(fact.index, Some(3));
    }
}
