//! NATS client wrapper
//!
//! Connection management with credentials and reconnection, plus access to
//! the JetStream context the worker consumes from.

use async_nats::{jetstream, Client, ConnectOptions};
use bytes::Bytes;
use std::time::Duration;
use tracing::info;

use crate::config::NatsArgs;
use crate::types::{EventEnvelope, ReputeError};

/// Default ping interval for keep-alive
const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(120);

/// NATS client wrapper with JetStream support
#[derive(Clone)]
pub struct NatsClient {
    client: Client,
}

impl NatsClient {
    /// Connect to NATS
    pub async fn new(args: &NatsArgs, name: &str) -> Result<Self, ReputeError> {
        info!("Connecting to NATS at {}", args.nats_url);

        // Fail fast on the initial connect; reconnection still applies afterwards
        let mut options = ConnectOptions::new()
            .name(name)
            .ping_interval(DEFAULT_PING_INTERVAL)
            .connection_timeout(Duration::from_secs(5));

        if let (Some(user), Some(pass)) = (&args.nats_user, &args.nats_password) {
            options = options.user_and_password(user.clone(), pass.clone());
        }

        let client = options
            .connect(&args.nats_url)
            .await
            .map_err(|e| ReputeError::Nats(format!("Failed to connect: {}", e)))?;

        info!(client = %name, "Connected to NATS at {}", args.nats_url);

        Ok(Self { client })
    }

    /// JetStream context over this connection
    pub fn jetstream(&self) -> jetstream::Context {
        jetstream::new(self.client.clone())
    }

    /// Publish an event envelope through JetStream and wait for the ack
    pub async fn publish_event(
        &self,
        subject: &str,
        envelope: &EventEnvelope,
    ) -> Result<(), ReputeError> {
        let payload: Bytes = envelope.to_bytes()?;
        self.jetstream()
            .publish(subject.to_string(), payload)
            .await
            .map_err(|e| ReputeError::Nats(format!("Publish failed: {}", e)))?
            .await
            .map_err(|e| ReputeError::Nats(format!("Publish not acknowledged: {}", e)))?;
        Ok(())
    }
}
