//! Processed event document schema
//!
//! Claim markers written by the event guard. The unique `key` index is what
//! turns a redelivered event into a duplicate-key error.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;
use crate::types::{EventKind, PostId, ProposalKind};

/// Collection name for processed event markers
pub const PROCESSED_EVENT_COLLECTION: &str = "processed_events";

/// Processed event document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedEventDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// `network:event:postType:postId:actor`
    pub key: String,

    pub network: String,

    pub event: EventKind,

    pub post_type: ProposalKind,

    pub post_id: PostId,

    /// Canonical address of the rewarded account
    pub actor: String,

    #[serde(flatten)]
    pub metadata: Metadata,
}

impl IntoIndexes for ProcessedEventDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "key": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("key_index".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for ProcessedEventDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
