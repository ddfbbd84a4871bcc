//! Activity document schema
//!
//! One immutable record per qualifying reputation event, read by the feed
//! and notification subsystems.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::activity::ActivityKind;
use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;
use crate::types::{PostId, ProposalKind};

/// Collection name for activities
pub const ACTIVITY_COLLECTION: &str = "activities";

/// Activity document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Canonical address of the acting account
    pub by: String,

    pub network: String,

    /// Number for indexed posts, verbatim `0x` string for hash-keyed posts
    pub post_id: PostId,

    pub post_type: ProposalKind,

    #[serde(rename = "type")]
    pub kind: ActivityKind,

    #[serde(flatten)]
    pub metadata: Metadata,
}

impl IntoIndexes for ActivityDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "by": 1 },
                Some(IndexOptions::builder().name("by_index".to_string()).build()),
            ),
            (
                doc! { "network": 1, "postType": 1, "postId": 1 },
                Some(IndexOptions::builder().name("post_index".to_string()).build()),
            ),
        ]
    }
}

impl MutMetadata for ActivityDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
