//! Worker module - JetStream consumer feeding the reputation processors
//!
//! Each message carries one [`EventEnvelope`](crate::types::EventEnvelope).
//! The processor outcome decides how the message is acknowledged:
//!
//! - success or skip: ack
//! - retryable error: nak with a redelivery delay
//! - anything else, including an undecodable payload: terminate

pub mod consumer;

pub use consumer::{
    disposition, event_subject, Disposition, Worker, WorkerConfig, CONSUMER_NAME,
    STREAM_NAME, SUBJECT_PREFIX,
};
