//! Repute - reputation event processor for on-chain governance
//!
//! Reacts to governance events (proposal created, decision deposit placed,
//! tip endorsed), corroborates them against a chain indexer, applies
//! anti-gaming rules, appends an activity record and adjusts a per-address
//! reputation score.
//!
//! ## Components
//!
//! - **Address**: canonical account form so spellings compare equal
//! - **Indexer**: typed GraphQL queries against the chain indexer
//! - **Rewards**: tier resolution and the static reward schedule
//! - **Stores**: activity log, score ledger and event guard (MongoDB or memory)
//! - **Processor**: the three event handlers
//! - **Worker**: NATS JetStream consumer feeding the processor

pub mod activity;
pub mod address;
pub mod config;
pub mod db;
pub mod guard;
pub mod indexer;
pub mod ledger;
pub mod logging;
pub mod nats;
pub mod processor;
pub mod rewards;
pub mod services;
pub mod types;
pub mod worker;

pub use address::{canonicalize, Address};
pub use config::{Args, CoreArgs};
pub use processor::{ProcessOutcome, ReputationProcessor, SkipReason};
pub use types::{ReputeError, Result};
