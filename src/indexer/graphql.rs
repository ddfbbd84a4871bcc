//! GraphQL-over-HTTP indexer client
//!
//! One endpoint per network. Every request is bounded by the configured
//! timeout; a timeout is reported as a retryable [`IndexerError::Timeout`],
//! distinct from "no matching row".

use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use super::queries::{self, ProposalsConnectionData, ProposalsData, TippersConnectionData};
use super::{IndexerError, IndexerGateway, Interaction, InteractionHistory, InteractionQuery};
use crate::types::{PostId, ProposalFact, ProposalKind, ReputeError};

/// Configuration for the GraphQL indexer client
#[derive(Debug, Clone)]
pub struct GraphQlIndexerConfig {
    /// Network name → GraphQL endpoint URL
    pub endpoints: HashMap<String, String>,
    /// Upper bound for a single query (default: 10 seconds)
    pub request_timeout: Duration,
}

impl Default for GraphQlIndexerConfig {
    fn default() -> Self {
        Self {
            endpoints: HashMap::new(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorEntry {
    message: String,
}

/// Indexer gateway backed by a GraphQL HTTP endpoint per network
pub struct GraphQlIndexer {
    config: GraphQlIndexerConfig,
    http_client: reqwest::Client,
}

impl GraphQlIndexer {
    pub fn new(config: GraphQlIndexerConfig) -> crate::types::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("repute/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                ReputeError::Config(format!("Failed to build indexer HTTP client: {}", e))
            })?;

        Ok(Self { config, http_client })
    }

    fn endpoint(&self, network: &str) -> Result<&str, IndexerError> {
        self.config
            .endpoints
            .get(network)
            .map(String::as_str)
            .ok_or_else(|| IndexerError::UnknownNetwork(network.to_string()))
    }

    /// Run one named query and decode its `data` object
    pub async fn query<T: DeserializeOwned>(
        &self,
        network: &str,
        operation: &str,
        document: &str,
        variables: Value,
    ) -> Result<T, IndexerError> {
        let url = self.endpoint(network)?;
        debug!(network = %network, operation = %operation, "Querying indexer");

        let body = json!({
            "query": document,
            "operationName": operation,
            "variables": variables,
        });

        let timeout = || IndexerError::Timeout {
            network: network.to_string(),
            query: operation.to_string(),
        };

        let send = self.http_client.post(url).json(&body).send();
        let response = tokio::time::timeout(self.config.request_timeout, send)
            .await
            .map_err(|_| timeout())?
            .map_err(|e| {
                if e.is_timeout() {
                    timeout()
                } else {
                    IndexerError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IndexerError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let payload: GraphQlResponse<T> = response
            .json()
            .await
            .map_err(|e| IndexerError::Decode(e.to_string()))?;

        decode_payload(payload)
    }
}

fn decode_payload<T>(payload: GraphQlResponse<T>) -> Result<T, IndexerError> {
    if !payload.errors.is_empty() {
        return Err(IndexerError::GraphQl(
            payload.errors.into_iter().map(|e| e.message).collect(),
        ));
    }
    payload
        .data
        .ok_or_else(|| IndexerError::Decode("response has neither data nor errors".to_string()))
}

#[async_trait::async_trait]
impl IndexerGateway for GraphQlIndexer {
    async fn proposal_origin(
        &self,
        network: &str,
        index: &PostId,
        kind: ProposalKind,
    ) -> Result<Option<ProposalFact>, IndexerError> {
        let data: ProposalsData = self
            .query(
                network,
                queries::PROPOSAL_ORIGIN_OP,
                queries::PROPOSAL_ORIGIN,
                json!({ "where": queries::proposal_where(index, kind) }),
            )
            .await?;
        Ok(data.proposals.into_iter().next())
    }

    async fn tip_details(
        &self,
        network: &str,
        index: &PostId,
        kind: ProposalKind,
    ) -> Result<Option<ProposalFact>, IndexerError> {
        let data: ProposalsData = self
            .query(
                network,
                queries::TIP_DETAILS_OP,
                queries::TIP_DETAILS,
                json!({ "where": queries::proposal_where(index, kind) }),
            )
            .await?;
        Ok(data.proposals.into_iter().next())
    }

    async fn interaction_history(
        &self,
        network: &str,
        query: &InteractionQuery,
    ) -> Result<InteractionHistory, IndexerError> {
        let variables = json!({ "where": queries::interaction_where(query) });

        let connection = match query.interaction {
            Interaction::ForeignDecisionDeposit => {
                let data: ProposalsConnectionData = self
                    .query(
                        network,
                        queries::FOREIGN_DECISION_DEPOSITS_OP,
                        queries::FOREIGN_DECISION_DEPOSITS,
                        variables,
                    )
                    .await?;
                data.proposals_connection
            }
            Interaction::TipGiven => {
                let data: TippersConnectionData = self
                    .query(network, queries::TIPS_GIVEN_OP, queries::TIPS_GIVEN, variables)
                    .await?;
                data.tippers_connection
            }
        };

        Ok(InteractionHistory {
            count: connection.total_count,
            earliest_at: connection.edges.first().map(|e| e.node.created_at),
        })
    }
}
