//! Configuration for Repute
//!
//! CLI arguments and environment variable handling using clap.
//! Options shared by the worker and the replay tool live in [`CoreArgs`].

use clap::Parser;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

use crate::indexer::GraphQlIndexerConfig;
use crate::rewards::RewardSchedule;
use crate::types::{ReputeError, Result};

/// Default indexer endpoints, one subsquid archive per network
pub const DEFAULT_INDEXER_URLS: &str = "polkadot=https://squid.subsquid.io/polkassembly-polkadot/graphql,\
kusama=https://squid.subsquid.io/polkassembly-kusama/graphql";

/// Repute worker - reputation event processor
#[derive(Parser, Debug, Clone)]
#[command(name = "repute")]
#[command(about = "Consumes governance events from NATS and updates reputation scores")]
#[command(version)]
pub struct Args {
    /// Worker ID, used for the NATS connection name and in logs
    #[arg(long, env = "WORKER_ID", default_value_t = Uuid::new_v4())]
    pub worker_id: Uuid,

    /// Maximum messages processed concurrently
    #[arg(long, env = "MAX_CONCURRENT", default_value = "8")]
    pub max_concurrent: usize,

    /// Redelivery delay for retryable failures, in milliseconds
    #[arg(long, env = "RETRY_DELAY_MS", default_value = "5000")]
    pub retry_delay_ms: u64,

    /// NATS configuration
    #[command(flatten)]
    pub nats: NatsArgs,

    /// Stores, indexer and logging
    #[command(flatten)]
    pub core: CoreArgs,
}

/// Options shared by every binary
#[derive(Parser, Debug, Clone)]
pub struct CoreArgs {
    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "repute")]
    pub mongodb_db: String,

    /// Comma-separated `network=url` pairs of GraphQL indexer endpoints
    #[arg(long, env = "INDEXER_URLS", default_value = DEFAULT_INDEXER_URLS)]
    pub indexer_urls: String,

    /// Upper bound for one indexer query, in milliseconds
    #[arg(long, env = "INDEXER_TIMEOUT_MS", default_value = "10000")]
    pub indexer_timeout_ms: u64,

    /// JSON reward schedule (built-in defaults when omitted)
    #[arg(long, env = "REWARD_SCHEDULE")]
    pub reward_schedule: Option<PathBuf>,

    /// Enable development mode (in-memory stores when MongoDB is unreachable)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit JSON log lines
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,
}

/// NATS connection configuration
#[derive(Parser, Debug, Clone)]
pub struct NatsArgs {
    /// NATS server URL
    #[arg(long, env = "NATS_URL", default_value = "nats://127.0.0.1:4222")]
    pub nats_url: String,

    /// NATS username (optional)
    #[arg(long, env = "NATS_USER")]
    pub nats_user: Option<String>,

    /// NATS password (optional)
    #[arg(long, env = "NATS_PASSWORD")]
    pub nats_password: Option<String>,
}

impl Args {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent == 0 {
            return Err(ReputeError::Config("MAX_CONCURRENT must be at least 1".to_string()));
        }
        self.core.validate()
    }
}

impl CoreArgs {
    /// Parse `INDEXER_URLS` into a network → endpoint map
    pub fn indexer_endpoints(&self) -> Result<HashMap<String, String>> {
        let mut endpoints = HashMap::new();

        for pair in self.indexer_urls.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (network, url) = pair.split_once('=').ok_or_else(|| {
                ReputeError::Config(format!("INDEXER_URLS entry '{}' is not network=url", pair))
            })?;
            let (network, url) = (network.trim(), url.trim());
            if network.is_empty() || url.is_empty() {
                return Err(ReputeError::Config(format!(
                    "INDEXER_URLS entry '{}' is not network=url",
                    pair
                )));
            }
            endpoints.insert(network.to_string(), url.to_string());
        }

        if endpoints.is_empty() {
            return Err(ReputeError::Config("INDEXER_URLS is empty".to_string()));
        }
        Ok(endpoints)
    }

    pub fn indexer_config(&self) -> Result<GraphQlIndexerConfig> {
        Ok(GraphQlIndexerConfig {
            endpoints: self.indexer_endpoints()?,
            request_timeout: Duration::from_millis(self.indexer_timeout_ms),
        })
    }

    /// Load and validate the reward schedule
    pub fn reward_schedule(&self) -> Result<RewardSchedule> {
        match &self.reward_schedule {
            Some(path) => RewardSchedule::load(path),
            None => Ok(RewardSchedule::default()),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.indexer_timeout_ms == 0 {
            return Err(ReputeError::Config("INDEXER_TIMEOUT_MS must be positive".to_string()));
        }
        self.indexer_endpoints()?;
        Ok(())
    }

    /// Filter used when `RUST_LOG` is unset
    pub fn default_log_filter(&self) -> String {
        format!("repute={},info", self.log_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["repute"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert_eq!(args.max_concurrent, 8);
        assert_eq!(args.retry_delay(), Duration::from_secs(5));
        assert_eq!(args.core.mongodb_db, "repute");
        assert_eq!(args.core.indexer_timeout_ms, 10_000);
        assert!(args.core.reward_schedule.is_none());
        assert!(args.validate().is_ok());

        let endpoints = args.core.indexer_endpoints().unwrap();
        assert!(endpoints.contains_key("polkadot"));
        assert!(endpoints.contains_key("kusama"));
    }

    #[test]
    fn test_indexer_urls_parsing() {
        let args = parse(&["--indexer-urls", " moonbeam = http://localhost:4350/graphql ,"]);
        let endpoints = args.core.indexer_endpoints().unwrap();
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints["moonbeam"], "http://localhost:4350/graphql");

        let args = parse(&["--indexer-urls", "polkadot"]);
        assert!(matches!(args.validate(), Err(ReputeError::Config(_))));

        let args = parse(&["--indexer-urls", ","]);
        assert!(args.core.indexer_endpoints().is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let args = parse(&["--indexer-timeout-ms", "0"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_missing_schedule_file_is_config_error() {
        let args = parse(&["--reward-schedule", "/nonexistent/rewards.json"]);
        assert!(matches!(args.core.reward_schedule(), Err(ReputeError::Config(_))));
    }
}
