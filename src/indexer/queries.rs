//! GraphQL documents and response shapes for the governance indexer
//!
//! The indexer exposes OpenCRUD-style filters (`field_eq`, `field_not_eq`, nested
//! relation filters) and Relay connections with `totalCount`.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::{Interaction, InteractionQuery};
use crate::types::{PostId, ProposalFact, ProposalKind};

pub const PROPOSAL_ORIGIN_OP: &str = "ProposalOrigin";
pub const PROPOSAL_ORIGIN: &str = r#"
query ProposalOrigin($where: ProposalWhereInput!) {
  proposals(limit: 1, where: $where) {
    index
    hash
    proposer
    createdAt
  }
}"#;

pub const TIP_DETAILS_OP: &str = "TipDetails";
pub const TIP_DETAILS: &str = r#"
query TipDetails($where: ProposalWhereInput!) {
  proposals(limit: 1, where: $where) {
    index
    hash
    payee
    reward
    createdAt
  }
}"#;

pub const FOREIGN_DECISION_DEPOSITS_OP: &str = "ForeignDecisionDeposits";
pub const FOREIGN_DECISION_DEPOSITS: &str = r#"
query ForeignDecisionDeposits($where: ProposalWhereInput!) {
  proposalsConnection(orderBy: createdAt_ASC, first: 1, where: $where) {
    totalCount
    edges {
      node {
        createdAt
      }
    }
  }
}"#;

pub const TIPS_GIVEN_OP: &str = "TipsGiven";
pub const TIPS_GIVEN: &str = r#"
query TipsGiven($where: TipperWhereInput!) {
  tippersConnection(orderBy: createdAt_ASC, first: 1, where: $where) {
    totalCount
    edges {
      node {
        createdAt
      }
    }
  }
}"#;

/// Referendum tracks that take decision deposits
const DECISION_DEPOSIT_TYPES: [ProposalKind; 2] =
    [ProposalKind::ReferendumV2, ProposalKind::FellowshipReferendum];

/// Filter selecting one proposal by numeric index or hash
pub fn proposal_where(index: &PostId, kind: ProposalKind) -> Value {
    match index {
        PostId::Numeric(n) => json!({ "index_eq": n, "type_eq": kind.indexer_type() }),
        PostId::Hash(h) => json!({ "hash_eq": h, "type_eq": kind.indexer_type() }),
    }
}

/// Filter for an interaction history count
pub fn interaction_where(query: &InteractionQuery) -> Value {
    let mut filter = Map::new();

    match query.interaction {
        Interaction::ForeignDecisionDeposit => {
            let types: Vec<&str> = DECISION_DEPOSIT_TYPES.iter().map(|k| k.indexer_type()).collect();
            filter.insert("type_in".into(), json!(types));
            filter.insert("decisionDeposit".into(), json!({ "who_eq": query.actor }));
            filter.insert("proposer_not_eq".into(), json!(query.actor));
            if let Some(ref counterpart) = query.counterpart {
                filter.insert("proposer_eq".into(), json!(counterpart));
            }
            if let Some(ref excluded) = query.excluding {
                insert_not_eq(&mut filter, excluded);
            }
        }
        Interaction::TipGiven => {
            filter.insert("tipper_eq".into(), json!(query.actor));

            let mut proposal = Map::new();
            if let Some(ref counterpart) = query.counterpart {
                proposal.insert("payee_eq".into(), json!(counterpart));
            }
            if let Some(ref excluded) = query.excluding {
                insert_not_eq(&mut proposal, excluded);
            }
            if !proposal.is_empty() {
                filter.insert("proposal".into(), Value::Object(proposal));
            }
        }
    }

    Value::Object(filter)
}

fn insert_not_eq(filter: &mut Map<String, Value>, id: &PostId) {
    match id {
        PostId::Numeric(n) => filter.insert("index_not_eq".into(), json!(n)),
        PostId::Hash(h) => filter.insert("hash_not_eq".into(), json!(h)),
    };
}

/// `{ proposals: [...] }`
#[derive(Debug, Deserialize)]
pub struct ProposalsData {
    #[serde(default)]
    pub proposals: Vec<ProposalFact>,
}

/// Relay connection with only the fields the counters read
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountConnection {
    pub total_count: u64,
    #[serde(default)]
    pub edges: Vec<CountEdge>,
}

#[derive(Debug, Deserialize)]
pub struct CountEdge {
    pub node: CreatedAtNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedAtNode {
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalsConnectionData {
    pub proposals_connection: CountConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TippersConnectionData {
    pub tippers_connection: CountConnection,
}
