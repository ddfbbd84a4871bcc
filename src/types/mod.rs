//! Shared types for Repute

pub mod error;
pub mod event;
pub mod proposal;

pub use error::{ReputeError, Result};
pub use event::{
    DecisionDepositPlaced, EventEnvelope, EventKind, ProposalCreated, ReputationEvent, Tipped,
};
pub use proposal::{PostId, ProposalFact, ProposalKind};
