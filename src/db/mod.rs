//! MongoDB persistence for activities, scores and event claims

pub mod mongo;
pub mod schemas;

pub use mongo::{MongoClient, MongoCollection};
