//! Reputation ledger
//!
//! Signed deltas applied per canonical address. Writes are atomic increments
//! so concurrent events for the same account never lose an update. There are
//! no bounds; a total may go negative.

use bson::{doc, DateTime};
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

use crate::address::Address;
use crate::db::schemas::{ReputationScoreDoc, SCORE_COLLECTION};
use crate::db::{MongoClient, MongoCollection};
use crate::types::{ReputeError, Result};

/// Per-address score store
#[async_trait::async_trait]
pub trait ReputationLedger: Send + Sync {
    /// Add `delta` to the score of `address`, creating it at zero first
    async fn apply_delta(&self, address: &Address, delta: i64) -> Result<()>;
}

// ============================================================================
// MongoDB Ledger
// ============================================================================

/// Ledger backed by the `reputation_scores` collection
pub struct MongoLedger {
    collection: MongoCollection<ReputationScoreDoc>,
}

impl MongoLedger {
    pub async fn new(client: &MongoClient) -> Result<Self> {
        let collection = client
            .collection::<ReputationScoreDoc>(SCORE_COLLECTION)
            .await?;
        Ok(Self { collection })
    }
}

#[async_trait::async_trait]
impl ReputationLedger for MongoLedger {
    async fn apply_delta(&self, address: &Address, delta: i64) -> Result<()> {
        let now = DateTime::now();
        let update = doc! {
            "$inc": { "score": delta },
            "$set": { "updatedAt": now },
            "$setOnInsert": { "createdAt": now, "isDeleted": false },
        };

        let result = self
            .collection
            .upsert_one(doc! { "address": address.as_str() }, update)
            .await?;

        debug!(
            address = %address,
            delta,
            created = result.upserted_id.is_some(),
            "Score updated"
        );
        Ok(())
    }
}

// ============================================================================
// In-Memory Ledger (for testing/local development)
// ============================================================================

/// In-memory ledger
#[derive(Default)]
pub struct InMemoryLedger {
    scores: DashMap<Address, i64>,
    failing: AtomicBool,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current score, zero for unknown addresses
    pub fn score(&self, address: &Address) -> i64 {
        self.scores.get(address).map(|s| *s).unwrap_or(0)
    }

    /// Number of addresses that were ever credited
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Make every write fail with a store error
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl ReputationLedger for InMemoryLedger {
    async fn apply_delta(&self, address: &Address, delta: i64) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ReputeError::Store("ledger unavailable".to_string()));
        }

        *self.scores.entry(address.clone()).or_insert(0) += delta;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::canonicalize;
    use std::sync::Arc;

    fn alice() -> Address {
        canonicalize("5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY").unwrap()
    }

    #[tokio::test]
    async fn test_negative_totals_allowed() {
        let ledger = InMemoryLedger::new();
        ledger.apply_delta(&alice(), 3).await.unwrap();
        ledger.apply_delta(&alice(), -5).await.unwrap();
        assert_eq!(ledger.score(&alice()), -2);
    }

    #[tokio::test]
    async fn test_concurrent_deltas_sum_exactly() {
        let ledger = Arc::new(InMemoryLedger::new());
        let mut handles = Vec::new();

        for i in 0..64 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                let delta = if i % 4 == 0 { -1 } else { 3 };
                ledger.apply_delta(&alice(), delta).await
            }));
        }

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // 48 × 3 − 16 × 1
        assert_eq!(ledger.score(&alice()), 128);
        assert_eq!(ledger.len(), 1);
    }

    #[tokio::test]
    async fn test_failing_ledger_leaves_scores_untouched() {
        let ledger = InMemoryLedger::new();
        ledger.set_failing(true);
        assert!(ledger.apply_delta(&alice(), 5).await.is_err());
        assert!(ledger.is_empty());
    }
}
