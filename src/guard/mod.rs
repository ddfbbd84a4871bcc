//! Event guard
//!
//! A claim on an event's stable key, taken after all reads and eligibility
//! checks and before the first write. A second delivery of the same event
//! finds the key taken and is skipped.

use bson::doc;
use dashmap::DashMap;
use std::fmt;
use tracing::debug;

use crate::address::Address;
use crate::db::schemas::{Metadata, ProcessedEventDoc, PROCESSED_EVENT_COLLECTION};
use crate::db::{MongoClient, MongoCollection};
use crate::types::{EventKind, PostId, ProposalKind, Result};

/// Identity of one qualifying event
///
/// Proposal indexes are only unique within a network and post type, so both
/// are part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub network: String,
    pub event: EventKind,
    pub proposal_kind: ProposalKind,
    pub post_id: PostId,
    pub actor: Address,
}

impl DedupKey {
    /// `network:event:postType:postId:actor`
    pub fn as_key(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}",
            self.network, self.event, self.proposal_kind, self.post_id, self.actor
        )
    }
}

impl fmt::Display for DedupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_key())
    }
}

/// De-duplication claims
#[async_trait::async_trait]
pub trait EventGuard: Send + Sync {
    /// Take the claim; `false` when it was already taken
    async fn claim(&self, key: &DedupKey) -> Result<bool>;

    /// Drop a claim so a redelivery can run again
    async fn release(&self, key: &DedupKey) -> Result<()>;
}

// ============================================================================
// MongoDB Guard
// ============================================================================

/// Guard backed by the unique `key` index of `processed_events`
pub struct MongoEventGuard {
    collection: MongoCollection<ProcessedEventDoc>,
}

impl MongoEventGuard {
    pub async fn new(client: &MongoClient) -> Result<Self> {
        let collection = client
            .collection::<ProcessedEventDoc>(PROCESSED_EVENT_COLLECTION)
            .await?;
        Ok(Self { collection })
    }
}

#[async_trait::async_trait]
impl EventGuard for MongoEventGuard {
    async fn claim(&self, key: &DedupKey) -> Result<bool> {
        let marker = ProcessedEventDoc {
            _id: None,
            key: key.as_key(),
            network: key.network.clone(),
            event: key.event,
            post_type: key.proposal_kind,
            post_id: key.post_id.clone(),
            actor: key.actor.to_string(),
            metadata: Metadata::default(),
        };

        let inserted = self.collection.insert_unique(marker).await?;
        if inserted.is_none() {
            debug!(key = %key, "Event already claimed");
        }
        Ok(inserted.is_some())
    }

    async fn release(&self, key: &DedupKey) -> Result<()> {
        self.collection
            .delete_one(doc! { "key": key.as_key() })
            .await?;
        Ok(())
    }
}

// ============================================================================
// In-Memory Guard (for testing/local development)
// ============================================================================

/// In-memory guard
#[derive(Default)]
pub struct InMemoryEventGuard {
    claimed: DashMap<String, ()>,
}

impl InMemoryEventGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_claimed(&self, key: &DedupKey) -> bool {
        self.claimed.contains_key(&key.as_key())
    }
}

#[async_trait::async_trait]
impl EventGuard for InMemoryEventGuard {
    async fn claim(&self, key: &DedupKey) -> Result<bool> {
        Ok(self.claimed.insert(key.as_key(), ()).is_none())
    }

    async fn release(&self, key: &DedupKey) -> Result<()> {
        self.claimed.remove(&key.as_key());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::canonicalize;

    fn key(post_id: PostId) -> DedupKey {
        DedupKey {
            network: "kusama".to_string(),
            event: EventKind::Tipped,
            proposal_kind: ProposalKind::Tip,
            post_id,
            actor: canonicalize("5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY").unwrap(),
        }
    }

    #[test]
    fn test_key_format() {
        assert_eq!(
            key(PostId::Hash("0xbeef".into())).as_key(),
            "kusama:tipped:tips:0xbeef:5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY"
        );
        assert_eq!(
            key(PostId::Numeric(9)).as_key(),
            "kusama:tipped:tips:9:5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY"
        );
    }

    #[tokio::test]
    async fn test_claim_once_then_release() {
        let guard = InMemoryEventGuard::new();
        let key = key(PostId::Numeric(9));

        assert!(guard.claim(&key).await.unwrap());
        assert!(!guard.claim(&key).await.unwrap());
        assert!(guard.is_claimed(&key));

        guard.release(&key).await.unwrap();
        assert!(!guard.is_claimed(&key));
        assert!(guard.claim(&key).await.unwrap());
    }

    #[tokio::test]
    async fn test_distinct_posts_do_not_collide() {
        let guard = InMemoryEventGuard::new();
        assert!(guard.claim(&key(PostId::Numeric(1))).await.unwrap());
        assert!(guard.claim(&key(PostId::Numeric(2))).await.unwrap());
    }
}
