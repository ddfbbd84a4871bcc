//! Reputation processor scenario tests
//!
//! Runs the three event handlers against the fixture indexer and the
//! in-memory stores:
//! - creation rewards per post category
//! - self-dealing and repeat-tip rejection
//! - tier resolution from indexer history
//! - duplicate delivery, indexer outage and store failures

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;
use tokio_test::assert_ok;

use repute::activity::{ActivityKind, InMemoryActivityRecorder};
use repute::address::{canonicalize, ss58_encode, Address};
use repute::guard::InMemoryEventGuard;
use repute::indexer::FixtureIndexer;
use repute::ledger::InMemoryLedger;
use repute::processor::{ProcessOutcome, ReputationProcessor, SkipReason};
use repute::rewards::{RewardSchedule, TierBracket};
use repute::types::{
    DecisionDepositPlaced, PostId, ProposalCreated, ProposalKind, ReputationEvent, ReputeError,
    Tipped,
};

const POLKADOT: &str = "polkadot";
const KUSAMA_PREFIX: u16 = 2;

// =============================================================================
// Harness
// =============================================================================

struct Harness {
    indexer: Arc<FixtureIndexer>,
    recorder: Arc<InMemoryActivityRecorder>,
    ledger: Arc<InMemoryLedger>,
    guard: Arc<InMemoryEventGuard>,
    processor: ReputationProcessor,
}

impl Harness {
    fn new() -> Self {
        Self::with_schedule(RewardSchedule::default())
    }

    fn with_schedule(schedule: RewardSchedule) -> Self {
        let indexer = Arc::new(FixtureIndexer::new());
        let recorder = Arc::new(InMemoryActivityRecorder::new());
        let ledger = Arc::new(InMemoryLedger::new());
        let guard = Arc::new(InMemoryEventGuard::new());

        let processor = ReputationProcessor::new(
            indexer.clone(),
            recorder.clone(),
            ledger.clone(),
            guard.clone(),
            Arc::new(schedule),
        );

        Self {
            indexer,
            recorder,
            ledger,
            guard,
            processor,
        }
    }

    async fn assert_no_writes(&self) {
        assert!(self.recorder.records().await.is_empty());
        assert!(self.ledger.is_empty());
    }
}

/// Generic-prefix SS58 address for a test account
fn account(seed: u8) -> String {
    ss58_encode(&[seed; 32], 42)
}

/// Same account spelled with the Kusama prefix
fn kusama_spelling(seed: u8) -> String {
    ss58_encode(&[seed; 32], KUSAMA_PREFIX)
}

fn canonical(raw: &str) -> Address {
    canonicalize(raw).unwrap()
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 2, 1, 9, 30, 0).unwrap()
}

fn proposal_created(index: PostId, kind: ProposalKind, proposer: &str) -> ReputationEvent {
    ReputationEvent::ProposalCreated(ProposalCreated {
        network: POLKADOT.to_string(),
        proposal_index: index,
        proposal_kind: kind,
        proposer: proposer.to_string(),
    })
}

fn deposit(index: i64, depositor: &str) -> ReputationEvent {
    ReputationEvent::DecisionDepositPlaced(DecisionDepositPlaced {
        network: POLKADOT.to_string(),
        proposal_index: PostId::Numeric(index),
        proposal_kind: ProposalKind::ReferendumV2,
        depositor: depositor.to_string(),
    })
}

fn tipped(index: PostId, tipper: &str) -> ReputationEvent {
    ReputationEvent::Tipped(Tipped {
        network: POLKADOT.to_string(),
        proposal_index: index,
        proposal_kind: ProposalKind::Tip,
        tipper: tipper.to_string(),
    })
}

fn applied_delta(outcome: &ProcessOutcome) -> (i64, Option<TierBracket>) {
    match outcome {
        ProcessOutcome::Applied { delta, tier, .. } => (*delta, *tier),
        other => panic!("expected applied outcome, got {:?}", other),
    }
}

// =============================================================================
// ProposalCreated
// =============================================================================

#[tokio::test]
async fn test_proposal_created_flat_reward() {
    let h = Harness::new();
    let proposer = account(1);
    h.indexer.add_proposal(POLKADOT, PostId::Numeric(88), ProposalKind::ReferendumV2, &proposer, t0());

    let outcome = assert_ok!(
        h.processor
            .process(&proposal_created(PostId::Numeric(88), ProposalKind::ReferendumV2, &proposer))
            .await
    );

    assert_eq!(applied_delta(&outcome), (5, None));
    assert_eq!(h.ledger.score(&canonical(&proposer)), 5);

    let records = h.recorder.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, ActivityKind::ProposalCreated);
    assert_eq!(records[0].post_id, PostId::Numeric(88));
    assert_eq!(records[0].post_type, ProposalKind::ReferendumV2);
    assert_eq!(records[0].created_at, t0());
    assert_eq!(records[0].by, canonical(&proposer));
}

#[tokio::test]
async fn test_creation_rewards_per_category() {
    let h = Harness::new();
    let proposer = account(2);

    let cases = [
        (ProposalKind::Bounty, 5, ActivityKind::BountyCreated),
        (ProposalKind::ChildBounty, 3, ActivityKind::ChildBountyCreated),
        (ProposalKind::Tip, 1, ActivityKind::TipCreated),
    ];

    for (i, (kind, reward, activity)) in cases.iter().enumerate() {
        let index = PostId::Numeric(i as i64);
        h.indexer.add_proposal(POLKADOT, index.clone(), *kind, &proposer, t0());

        let outcome = assert_ok!(
            h.processor.process(&proposal_created(index, *kind, &proposer)).await
        );
        match outcome {
            ProcessOutcome::Applied { delta, activity: recorded, tier, .. } => {
                assert_eq!(delta, *reward, "reward for {}", kind);
                assert_eq!(recorded, *activity);
                assert!(tier.is_none());
            }
            other => panic!("expected applied outcome, got {:?}", other),
        }
    }

    assert_eq!(h.ledger.score(&canonical(&proposer)), 5 + 3 + 1);
}

#[tokio::test]
async fn test_proposal_created_unknown_proposal() {
    let h = Harness::new();

    let err = h
        .processor
        .process(&proposal_created(PostId::Numeric(404), ProposalKind::Referendum, &account(3)))
        .await
        .unwrap_err();

    assert!(
        matches!(&err, ReputeError::NotFound(msg) if msg == "failed to fetch proposal creation timestamp")
    );
    assert!(!err.is_retryable());
    h.assert_no_writes().await;
}

#[tokio::test]
async fn test_invalid_actor_address() {
    let h = Harness::new();

    let err = h
        .processor
        .process(&proposal_created(PostId::Numeric(1), ProposalKind::Referendum, "not-an-account"))
        .await
        .unwrap_err();

    assert!(matches!(err, ReputeError::InvalidAddress(_)));
    h.assert_no_writes().await;
}

#[tokio::test]
async fn test_hash_keyed_post_stays_hash() {
    let h = Harness::new();
    let proposer = account(4);
    let hash = PostId::Hash("0x5d1e7a0c".to_string());
    h.indexer.add_proposal(POLKADOT, hash.clone(), ProposalKind::Tip, &proposer, t0());

    assert_ok!(h.processor.process(&proposal_created(hash.clone(), ProposalKind::Tip, &proposer)).await);

    let records = h.recorder.records().await;
    assert_eq!(records[0].post_id, hash);
}

// =============================================================================
// DecisionDepositPlaced
// =============================================================================

#[tokio::test]
async fn test_deposit_on_own_proposal_is_skipped() {
    let h = Harness::new();
    // Indexer returns the proposer with another network's prefix
    h.indexer.add_proposal(POLKADOT, PostId::Numeric(7), ProposalKind::ReferendumV2, &kusama_spelling(5), t0());

    let outcome = assert_ok!(h.processor.process(&deposit(7, &account(5))).await);

    assert_eq!(outcome, ProcessOutcome::Skipped(SkipReason::SelfDealing));
    h.assert_no_writes().await;
}

#[tokio::test]
async fn test_first_foreign_deposit() {
    let h = Harness::new();
    let depositor = account(6);
    h.indexer.add_proposal(POLKADOT, PostId::Numeric(8), ProposalKind::ReferendumV2, &account(60), t0());

    let before = Utc::now();
    let outcome = assert_ok!(h.processor.process(&deposit(8, &depositor)).await);
    let after = Utc::now();

    assert_eq!(applied_delta(&outcome), (2, Some(TierBracket::First)));
    assert_eq!(h.ledger.score(&canonical(&depositor)), 2);

    let records = h.recorder.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, ActivityKind::DecisionDepositOnForeignProposal);
    // No earlier deposit to date the activity by
    assert!(records[0].created_at >= before && records[0].created_at <= after);
}

#[tokio::test]
async fn test_first_foreign_deposit_already_indexed() {
    let h = Harness::new();
    let depositor = account(21);
    h.indexer.add_proposal(POLKADOT, PostId::Numeric(42), ProposalKind::ReferendumV2, &account(210), t0());
    // The indexer has already seen the deposit that triggered the event
    h.indexer.add_decision_deposit(POLKADOT, PostId::Numeric(42), &depositor, &account(210), t0());

    let outcome = assert_ok!(h.processor.process(&deposit(42, &depositor)).await);

    assert_eq!(applied_delta(&outcome), (2, Some(TierBracket::First)));
    assert_eq!(h.ledger.score(&canonical(&depositor)), 2);
}

#[tokio::test]
async fn test_third_foreign_deposit_tier() {
    let h = Harness::new();
    let depositor = account(7);
    let earliest = t0() - Duration::days(30);

    h.indexer.add_proposal(POLKADOT, PostId::Numeric(9), ProposalKind::ReferendumV2, &account(70), t0());
    h.indexer.add_decision_deposit(POLKADOT, PostId::Numeric(91), &depositor, &account(71), earliest);
    h.indexer.add_decision_deposit(
        POLKADOT,
        PostId::Numeric(92),
        &depositor,
        &account(72),
        earliest + Duration::days(3),
    );
    // Own-proposal deposits do not count
    h.indexer.add_decision_deposit(
        POLKADOT,
        PostId::Numeric(93),
        &depositor,
        &depositor,
        earliest - Duration::days(1),
    );
    // Nor does the deposit being processed
    h.indexer.add_decision_deposit(POLKADOT, PostId::Numeric(9), &depositor, &account(70), t0());

    let outcome = assert_ok!(h.processor.process(&deposit(9, &depositor)).await);

    assert_eq!(applied_delta(&outcome), (5, Some(TierBracket::ThirdOrMore)));
    let records = h.recorder.records().await;
    assert_eq!(records[0].created_at, earliest);
}

#[tokio::test]
async fn test_deposit_without_proposer() {
    let h = Harness::new();

    let err = h.processor.process(&deposit(10, &account(8))).await.unwrap_err();

    assert!(matches!(&err, ReputeError::NotFound(msg) if msg == "failed to fetch proposal proposer"));
    h.assert_no_writes().await;
}

// =============================================================================
// Tipped
// =============================================================================

#[tokio::test]
async fn test_first_tip_to_new_payee() {
    let h = Harness::new();
    let tipper = account(9);
    let tip_at = t0() + Duration::hours(6);
    let index = PostId::Hash("0x8a3fbeef".to_string());
    h.indexer.add_tip_proposal(POLKADOT, index.clone(), Some(account(90).as_str()), Some(10_000_000_000), tip_at);

    let outcome = assert_ok!(h.processor.process(&tipped(index.clone(), &tipper)).await);

    assert_eq!(applied_delta(&outcome), (1, Some(TierBracket::First)));
    assert_eq!(h.ledger.score(&canonical(&tipper)), 1);

    let records = h.recorder.records().await;
    assert_eq!(records[0].kind, ActivityKind::TipGiven);
    assert_eq!(records[0].created_at, tip_at);
    assert_eq!(records[0].post_id, index);
}

#[tokio::test]
async fn test_repeat_tip_to_same_payee_is_skipped() {
    let h = Harness::new();
    let tipper = account(10);
    let payee = account(100);
    let tip_at = t0();

    h.indexer.add_tip(POLKADOT, PostId::Numeric(2), &tipper, &payee, tip_at - Duration::days(10));
    h.indexer.add_tip_proposal(POLKADOT, PostId::Numeric(3), Some(payee.as_str()), Some(1), tip_at);

    let outcome = assert_ok!(h.processor.process(&tipped(PostId::Numeric(3), &tipper)).await);

    assert_eq!(outcome, ProcessOutcome::Skipped(SkipReason::RepeatTip));
    h.assert_no_writes().await;
}

#[tokio::test]
async fn test_repeat_tip_given_after_proposal_creation_is_skipped() {
    let h = Harness::new();
    let tipper = account(22);
    let payee = account(220);
    let created = t0();

    h.indexer.add_tip_proposal(POLKADOT, PostId::Numeric(2), Some(payee.as_str()), Some(5), created);
    h.indexer.add_tip(POLKADOT, PostId::Numeric(1), &tipper, &payee, created + Duration::days(1));
    h.indexer.add_tip(POLKADOT, PostId::Numeric(2), &tipper, &payee, created + Duration::days(2));

    let outcome = assert_ok!(h.processor.process(&tipped(PostId::Numeric(2), &tipper)).await);

    assert_eq!(outcome, ProcessOutcome::Skipped(SkipReason::RepeatTip));
    h.assert_no_writes().await;
}

#[tokio::test]
async fn test_tip_tier_counts_other_tips_only() {
    let h = Harness::new();
    let tipper = account(11);
    let tip_at = t0();

    h.indexer.add_tip_proposal(POLKADOT, PostId::Numeric(4), Some(account(110).as_str()), Some(5), tip_at);
    h.indexer.add_tip(POLKADOT, PostId::Numeric(20), &tipper, &account(111), tip_at - Duration::days(2));
    // Tips given after this proposal was created count as well
    h.indexer.add_tip(POLKADOT, PostId::Numeric(21), &tipper, &account(112), tip_at + Duration::days(1));
    // The tip being processed does not
    h.indexer.add_tip(POLKADOT, PostId::Numeric(4), &tipper, &account(110), tip_at + Duration::days(2));

    let outcome = assert_ok!(h.processor.process(&tipped(PostId::Numeric(4), &tipper)).await);

    assert_eq!(applied_delta(&outcome), (3, Some(TierBracket::ThirdOrMore)));
}

#[tokio::test]
async fn test_tip_missing_rows() {
    let h = Harness::new();
    let tipper = account(12);

    let err = h.processor.process(&tipped(PostId::Numeric(5), &tipper)).await.unwrap_err();
    assert!(matches!(&err, ReputeError::NotFound(msg) if msg == "failed to fetch tip"));

    h.indexer.add_tip_proposal(POLKADOT, PostId::Numeric(6), None, Some(5), t0());
    let err = h.processor.process(&tipped(PostId::Numeric(6), &tipper)).await.unwrap_err();
    assert!(matches!(&err, ReputeError::NotFound(msg) if msg == "tip payee or reward missing"));

    h.indexer.add_tip_proposal(POLKADOT, PostId::Numeric(7), Some(account(120).as_str()), None, t0());
    let err = h.processor.process(&tipped(PostId::Numeric(7), &tipper)).await.unwrap_err();
    assert!(matches!(&err, ReputeError::NotFound(msg) if msg == "tip payee or reward missing"));

    h.assert_no_writes().await;
}

// =============================================================================
// Delivery and failure handling
// =============================================================================

#[tokio::test]
async fn test_duplicate_delivery_is_skipped() {
    let h = Harness::new();
    let depositor = account(13);
    h.indexer.add_proposal(POLKADOT, PostId::Numeric(11), ProposalKind::ReferendumV2, &account(130), t0());

    let event = deposit(11, &depositor);
    assert_ok!(h.processor.process(&event).await);
    let second = assert_ok!(h.processor.process(&event).await);

    assert_eq!(second, ProcessOutcome::Skipped(SkipReason::AlreadyProcessed));
    assert_eq!(h.recorder.records().await.len(), 1);
    assert_eq!(h.ledger.score(&canonical(&depositor)), 2);
}

#[tokio::test]
async fn test_indexer_outage_is_retryable() {
    let h = Harness::new();
    h.indexer.add_proposal(POLKADOT, PostId::Numeric(12), ProposalKind::ReferendumV2, &account(140), t0());
    h.indexer.set_unavailable(true);

    let err = h.processor.process(&deposit(12, &account(14))).await.unwrap_err();

    assert!(matches!(err, ReputeError::Gateway(_)));
    assert!(err.is_retryable());
    h.assert_no_writes().await;

    h.indexer.set_unavailable(false);
    assert_ok!(h.processor.process(&deposit(12, &account(14))).await);
}

#[tokio::test]
async fn test_failed_activity_write_releases_claim() {
    let h = Harness::new();
    let proposer = account(15);
    h.indexer.add_proposal(POLKADOT, PostId::Numeric(13), ProposalKind::Bounty, &proposer, t0());
    let event = proposal_created(PostId::Numeric(13), ProposalKind::Bounty, &proposer);

    h.recorder.set_failing(true);
    let err = h.processor.process(&event).await.unwrap_err();
    assert!(matches!(err, ReputeError::Store(_)));
    h.assert_no_writes().await;

    h.recorder.set_failing(false);
    let outcome = assert_ok!(h.processor.process(&event).await);
    assert!(outcome.is_applied());
    assert_eq!(h.ledger.score(&canonical(&proposer)), 5);
}

#[tokio::test]
async fn test_failed_ledger_write_keeps_claim() {
    let h = Harness::new();
    let proposer = account(16);
    h.indexer.add_proposal(POLKADOT, PostId::Numeric(14), ProposalKind::Referendum, &proposer, t0());
    let event = proposal_created(PostId::Numeric(14), ProposalKind::Referendum, &proposer);

    h.ledger.set_failing(true);
    let err = h.processor.process(&event).await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(h.recorder.records().await.len(), 1);

    h.ledger.set_failing(false);
    let redelivered = assert_ok!(h.processor.process(&event).await);
    assert_eq!(redelivered, ProcessOutcome::Skipped(SkipReason::AlreadyProcessed));
    assert_eq!(h.recorder.records().await.len(), 1);
    assert_eq!(h.ledger.score(&canonical(&proposer)), 0);
}

#[tokio::test]
async fn test_skips_take_no_claim() {
    let h = Harness::new();
    let depositor = account(17);
    h.indexer.add_proposal(POLKADOT, PostId::Numeric(15), ProposalKind::ReferendumV2, &depositor, t0());

    let outcome = assert_ok!(h.processor.process(&deposit(15, &depositor)).await);
    assert_eq!(outcome, ProcessOutcome::Skipped(SkipReason::SelfDealing));

    let key = repute::guard::DedupKey {
        network: POLKADOT.to_string(),
        event: repute::types::EventKind::DecisionDepositPlaced,
        proposal_kind: ProposalKind::ReferendumV2,
        post_id: PostId::Numeric(15),
        actor: canonical(&depositor),
    };
    assert!(!h.guard.is_claimed(&key));
}

#[tokio::test]
async fn test_concurrent_events_for_one_address() {
    let h = Arc::new(Harness::new());
    let proposer = account(18);

    for i in 0..20 {
        h.indexer.add_proposal(POLKADOT, PostId::Numeric(i), ProposalKind::ChildBounty, &proposer, t0());
    }

    let mut handles = Vec::new();
    for i in 0..20 {
        let h = h.clone();
        let proposer = proposer.clone();
        handles.push(tokio::spawn(async move {
            h.processor
                .process(&proposal_created(PostId::Numeric(i), ProposalKind::ChildBounty, &proposer))
                .await
        }));
    }

    for handle in handles {
        assert_ok!(handle.await.unwrap());
    }

    assert_eq!(h.ledger.score(&canonical(&proposer)), 20 * 3);
    assert_eq!(h.recorder.records().await.len(), 20);
}

#[tokio::test]
async fn test_custom_schedule_is_used() {
    let schedule = RewardSchedule::from_json(
        r#"{
            "creation": { "proposal": 10, "bounty": 8, "child_bounty": 4, "tip": 2 },
            "tiered": {
                "decision_deposit_placed": { "first": 7, "second": 1, "third_or_more": 1 },
                "tipped": { "first": 3, "second": 2, "third_or_more": 1 }
            }
        }"#,
    )
    .unwrap();
    let h = Harness::with_schedule(schedule);
    let depositor = account(19);
    h.indexer.add_proposal(POLKADOT, PostId::Numeric(16), ProposalKind::ReferendumV2, &account(190), t0());

    let outcome = assert_ok!(h.processor.process(&deposit(16, &depositor)).await);
    assert_eq!(applied_delta(&outcome), (7, Some(TierBracket::First)));
}
