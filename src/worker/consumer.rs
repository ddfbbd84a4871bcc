//! Worker consumer - NATS JetStream pull consumer for reputation events

use async_nats::jetstream::{self, consumer::PullConsumer, stream::Stream, AckKind};
use futures_util::StreamExt;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::processor::{ProcessOutcome, ReputationProcessor};
use crate::types::{EventEnvelope, ReputationEvent, ReputeError, Result};

/// JetStream stream holding reputation events
pub const STREAM_NAME: &str = "REPUTATION_EVENTS";
pub const SUBJECT_PREFIX: &str = "reputation.events";
/// Durable consumer shared by every worker, so the stream is processed once
pub const CONSUMER_NAME: &str = "repute_worker";

/// Subject an event is published on: `reputation.events.<event>.<network>`
pub fn event_subject(event: &ReputationEvent) -> String {
    format!("{}.{}.{}", SUBJECT_PREFIX, event.kind(), event.network())
}

/// How a processed message is acknowledged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Ack,
    /// Redeliver after the delay
    Nak(Duration),
    /// Never redeliver
    Term,
}

impl Disposition {
    fn ack_kind(self) -> AckKind {
        match self {
            Self::Ack => AckKind::Ack,
            Self::Nak(delay) => AckKind::Nak(Some(delay)),
            Self::Term => AckKind::Term,
        }
    }
}

/// Map a processing result to its acknowledgement
pub fn disposition(result: &Result<ProcessOutcome>, retry_delay: Duration) -> Disposition {
    match result {
        Ok(_) => Disposition::Ack,
        Err(e) if e.is_retryable() => Disposition::Nak(retry_delay),
        Err(_) => Disposition::Term,
    }
}

/// Worker configuration
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Worker ID, used in logs only
    pub worker_id: String,
    /// Maximum messages in flight
    pub max_concurrent: usize,
    /// Delay before a retryable failure is redelivered
    pub retry_delay: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            worker_id: uuid::Uuid::new_v4().to_string(),
            max_concurrent: 8,
            retry_delay: Duration::from_secs(5),
        }
    }
}

/// Pull consumer driving the processors
pub struct Worker {
    config: WorkerConfig,
    jetstream: jetstream::Context,
    processor: ReputationProcessor,
    running: Arc<RwLock<bool>>,
}

impl Worker {
    pub fn new(
        config: WorkerConfig,
        jetstream: jetstream::Context,
        processor: ReputationProcessor,
    ) -> Self {
        Self {
            config,
            jetstream,
            processor,
            running: Arc::new(RwLock::new(true)),
        }
    }

    /// Run the processing loop until stopped
    pub async fn run(&self) -> Result<()> {
        let stream = self.ensure_stream().await?;
        let consumer = self.ensure_consumer(&stream).await?;

        info!(worker_id = %self.config.worker_id, "Worker starting event processing loop");

        self.drive(|| self.process_batch(&consumer)).await;

        info!(worker_id = %self.config.worker_id, "Worker stopped");
        Ok(())
    }

    /// Stop after the current batch
    pub async fn stop(&self) {
        *self.running.write().await = false;
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// Run `batch` repeatedly; a stop takes effect once the batch in flight returns
    async fn drive<F, Fut>(&self, mut batch: F)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<usize>>,
    {
        while self.is_running().await {
            match batch().await {
                Ok(count) => {
                    if count > 0 {
                        debug!("Processed {} events", count);
                    }
                }
                Err(e) => {
                    error!("Error processing batch: {}", e);
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }

    async fn ensure_stream(&self) -> Result<Stream> {
        let stream = self
            .jetstream
            .get_or_create_stream(jetstream::stream::Config {
                name: STREAM_NAME.to_string(),
                subjects: vec![format!("{}.>", SUBJECT_PREFIX)],
                max_age: Duration::from_secs(7 * 24 * 3600),
                storage: jetstream::stream::StorageType::File,
                ..Default::default()
            })
            .await
            .map_err(|e| ReputeError::Nats(format!("Failed to create stream: {e}")))?;

        info!("Using stream {} with subjects {}.>", STREAM_NAME, SUBJECT_PREFIX);
        Ok(stream)
    }

    /// Pull consumer config; identical for every worker so they share one durable
    fn consumer_config(&self) -> jetstream::consumer::pull::Config {
        jetstream::consumer::pull::Config {
            durable_name: Some(CONSUMER_NAME.to_string()),
            ack_policy: jetstream::consumer::AckPolicy::Explicit,
            filter_subject: format!("{SUBJECT_PREFIX}.>"),
            max_ack_pending: self.config.max_concurrent as i64,
            ..Default::default()
        }
    }

    async fn ensure_consumer(&self, stream: &Stream) -> Result<PullConsumer> {
        let consumer = stream
            .get_or_create_consumer(CONSUMER_NAME, self.consumer_config())
            .await
            .map_err(|e| ReputeError::Nats(format!("Failed to create consumer: {e}")))?;

        info!(worker_id = %self.config.worker_id, "Using consumer {}", CONSUMER_NAME);
        Ok(consumer)
    }

    /// Fetch one batch and process it concurrently
    async fn process_batch(&self, consumer: &PullConsumer) -> Result<usize> {
        let messages = consumer
            .fetch()
            .max_messages(self.config.max_concurrent)
            .expires(Duration::from_secs(5))
            .messages()
            .await
            .map_err(|e| ReputeError::Nats(format!("Failed to fetch messages: {e}")))?;

        let count = AtomicUsize::new(0);
        let count_ref = &count;

        messages
            .for_each_concurrent(self.config.max_concurrent, |msg_result| async move {
                match msg_result {
                    Ok(msg) => {
                        count_ref.fetch_add(1, Ordering::Relaxed);
                        self.process_message(msg).await;
                    }
                    Err(e) => warn!("Error receiving message: {}", e),
                }
            })
            .await;

        Ok(count.into_inner())
    }

    async fn process_message(&self, msg: jetstream::Message) {
        let envelope = match EventEnvelope::from_bytes(&msg.payload) {
            Ok(envelope) => envelope,
            Err(e) => {
                error!(subject = %msg.subject, "Malformed event payload: {}", e);
                if let Err(e) = msg.ack_with(AckKind::Term).await {
                    warn!("Failed to terminate malformed message: {}", e);
                }
                return;
            }
        };

        let event_id = envelope.event_id.as_deref().unwrap_or("-");
        let result = self.processor.process(&envelope.event).await;
        let disposition = disposition(&result, self.config.retry_delay);

        match &result {
            Ok(ProcessOutcome::Skipped(reason)) => {
                debug!(event_id, event = %envelope.event.kind(), reason = ?reason, "Event skipped");
            }
            Ok(ProcessOutcome::Applied { .. }) => {}
            Err(e) if e.is_retryable() => {
                warn!(event_id, event = %envelope.event.kind(), error = %e, "Event failed, will retry");
            }
            Err(e) => {
                error!(
                    event_id,
                    event = %envelope.event.kind(),
                    network = %envelope.event.network(),
                    post_id = %envelope.event.post_id(),
                    error = %e,
                    "Event failed permanently"
                );
            }
        }

        if let Err(e) = msg.ack_with(disposition.ack_kind()).await {
            warn!(event_id, "Failed to acknowledge message: {}", e);
        }
    }
}
