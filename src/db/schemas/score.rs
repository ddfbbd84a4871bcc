//! Reputation score document schema
//!
//! One document per canonical address. The score is only ever changed by a
//! server-side `$inc`, see [`crate::ledger::MongoLedger`].

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for reputation scores
pub const SCORE_COLLECTION: &str = "reputation_scores";

/// Reputation score document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReputationScoreDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Canonical address
    pub address: String,

    /// Running total, may go negative
    #[serde(default)]
    pub score: i64,

    #[serde(flatten)]
    pub metadata: Metadata,
}

impl IntoIndexes for ReputationScoreDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "address": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("address_index".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for ReputationScoreDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
