//! Database schemas for Repute
//!
//! Defines MongoDB document structures for activities, reputation scores and
//! processed event markers.

mod activity;
mod metadata;
mod processed_event;
mod score;

pub use activity::{ActivityDoc, ACTIVITY_COLLECTION};
pub use metadata::Metadata;
pub use processed_event::{ProcessedEventDoc, PROCESSED_EVENT_COLLECTION};
pub use score::{ReputationScoreDoc, SCORE_COLLECTION};
