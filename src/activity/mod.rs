//! Activity recorder
//!
//! Append-only log of qualifying reputation events, consumed by the feed and
//! notification subsystems. The recorder does no de-duplication of its own;
//! that is the event guard's job.

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use crate::address::Address;
use crate::db::schemas::{ActivityDoc, Metadata, ACTIVITY_COLLECTION};
use crate::db::{MongoClient, MongoCollection};
use crate::rewards::CreationCategory;
use crate::types::{PostId, ProposalKind, ReputeError, Result};

/// Activity type stored in the `type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    ProposalCreated,
    BountyCreated,
    ChildBountyCreated,
    TipCreated,
    DecisionDepositOnForeignProposal,
    TipGiven,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProposalCreated => "proposal_created",
            Self::BountyCreated => "bounty_created",
            Self::ChildBountyCreated => "child_bounty_created",
            Self::TipCreated => "tip_created",
            Self::DecisionDepositOnForeignProposal => "decision_deposit_on_foreign_proposal",
            Self::TipGiven => "tip_given",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<CreationCategory> for ActivityKind {
    fn from(category: CreationCategory) -> Self {
        match category {
            CreationCategory::Proposal => Self::ProposalCreated,
            CreationCategory::Bounty => Self::BountyCreated,
            CreationCategory::ChildBounty => Self::ChildBountyCreated,
            CreationCategory::Tip => Self::TipCreated,
        }
    }
}

/// One activity to append
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    pub by: Address,
    pub network: String,
    pub post_id: PostId,
    pub post_type: ProposalKind,
    pub kind: ActivityKind,
    /// On-chain time of the underlying event
    pub created_at: DateTime<Utc>,
}

impl From<ActivityRecord> for ActivityDoc {
    fn from(record: ActivityRecord) -> Self {
        ActivityDoc {
            _id: None,
            by: record.by.to_string(),
            network: record.network,
            post_id: record.post_id,
            post_type: record.post_type,
            kind: record.kind,
            metadata: Metadata::created_at(bson::DateTime::from_chrono(record.created_at)),
        }
    }
}

/// Append-only activity sink
#[async_trait::async_trait]
pub trait ActivityRecorder: Send + Sync {
    /// Store the record and return its id
    async fn record(&self, record: ActivityRecord) -> Result<String>;
}

// ============================================================================
// MongoDB Recorder
// ============================================================================

/// Activity recorder backed by the `activities` collection
pub struct MongoActivityRecorder {
    collection: MongoCollection<ActivityDoc>,
}

impl MongoActivityRecorder {
    pub async fn new(client: &MongoClient) -> Result<Self> {
        let collection = client.collection::<ActivityDoc>(ACTIVITY_COLLECTION).await?;
        Ok(Self { collection })
    }
}

#[async_trait::async_trait]
impl ActivityRecorder for MongoActivityRecorder {
    async fn record(&self, record: ActivityRecord) -> Result<String> {
        let id: ObjectId = self.collection.insert_one(record.into()).await?;
        Ok(id.to_hex())
    }
}

// ============================================================================
// In-Memory Recorder (for testing/local development)
// ============================================================================

/// In-memory activity recorder
#[derive(Default)]
pub struct InMemoryActivityRecorder {
    records: RwLock<Vec<(String, ActivityRecord)>>,
    failing: AtomicBool,
}

impl InMemoryActivityRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far
    pub async fn records(&self) -> Vec<ActivityRecord> {
        self.records.read().await.iter().map(|(_, r)| r.clone()).collect()
    }

    /// Make every write fail with a store error
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl ActivityRecorder for InMemoryActivityRecorder {
    async fn record(&self, record: ActivityRecord) -> Result<String> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ReputeError::Store("activity store unavailable".to_string()));
        }

        let id = uuid::Uuid::new_v4().to_string();
        self.records.write().await.push((id.clone(), record));
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::canonicalize;
    use chrono::TimeZone;

    fn record() -> ActivityRecord {
        ActivityRecord {
            by: canonicalize("5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY").unwrap(),
            network: "polkadot".to_string(),
            post_id: PostId::Numeric(12),
            post_type: ProposalKind::ChildBounty,
            kind: ActivityKind::ChildBountyCreated,
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_activity_kind_for_category() {
        assert_eq!(ActivityKind::from(CreationCategory::Proposal), ActivityKind::ProposalCreated);
        assert_eq!(ActivityKind::from(CreationCategory::Tip), ActivityKind::TipCreated);
        assert_eq!(
            serde_json::to_value(ActivityKind::DecisionDepositOnForeignProposal).unwrap(),
            "decision_deposit_on_foreign_proposal"
        );
    }

    #[test]
    fn test_document_keeps_on_chain_time() {
        let record = record();
        let doc = ActivityDoc::from(record.clone());
        assert_eq!(doc.by, record.by.as_str());
        assert_eq!(
            doc.metadata.created_at.map(|t| t.to_chrono()),
            Some(record.created_at)
        );
        assert!(doc.metadata.updated_at.is_none());
    }

    #[tokio::test]
    async fn test_in_memory_recorder_appends() {
        let recorder = InMemoryActivityRecorder::new();
        let first = recorder.record(record()).await.unwrap();
        let second = recorder.record(record()).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(recorder.records().await.len(), 2);
    }

    #[tokio::test]
    async fn test_in_memory_recorder_failure() {
        let recorder = InMemoryActivityRecorder::new();
        recorder.set_failing(true);
        let err = recorder.record(record()).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(recorder.records().await.is_empty());
    }
}
