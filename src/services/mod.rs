//! Service wiring
//!
//! Builds a [`ReputationProcessor`] from configuration: the GraphQL indexer,
//! the reward schedule and either MongoDB or in-memory stores.

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::activity::{ActivityRecorder, InMemoryActivityRecorder, MongoActivityRecorder};
use crate::config::CoreArgs;
use crate::db::MongoClient;
use crate::guard::{EventGuard, InMemoryEventGuard, MongoEventGuard};
use crate::indexer::{GraphQlIndexer, IndexerGateway};
use crate::ledger::{InMemoryLedger, MongoLedger, ReputationLedger};
use crate::processor::ReputationProcessor;
use crate::rewards::RewardSchedule;
use crate::types::Result;

/// Which backend the stores run on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    InMemory,
}

/// Activity recorder, ledger and guard sharing one backend
#[derive(Clone)]
pub struct Stores {
    pub recorder: Arc<dyn ActivityRecorder>,
    pub ledger: Arc<dyn ReputationLedger>,
    pub guard: Arc<dyn EventGuard>,
    pub backend: StoreBackend,
}

impl Stores {
    /// MongoDB collections, with indexes applied
    pub async fn mongo(client: &MongoClient) -> Result<Self> {
        Ok(Self {
            recorder: Arc::new(MongoActivityRecorder::new(client).await?),
            ledger: Arc::new(MongoLedger::new(client).await?),
            guard: Arc::new(MongoEventGuard::new(client).await?),
            backend: StoreBackend::Mongo,
        })
    }

    /// Process-local stores, lost on exit
    pub fn in_memory() -> Self {
        Self {
            recorder: Arc::new(InMemoryActivityRecorder::new()),
            ledger: Arc::new(InMemoryLedger::new()),
            guard: Arc::new(InMemoryEventGuard::new()),
            backend: StoreBackend::InMemory,
        }
    }

    /// Connect to MongoDB, falling back to memory in dev mode
    pub async fn connect(core: &CoreArgs) -> Result<Self> {
        let connected = match MongoClient::new(&core.mongodb_uri, &core.mongodb_db).await {
            Ok(client) => Stores::mongo(&client).await,
            Err(e) => Err(e),
        };

        match connected {
            Ok(stores) => {
                info!("MongoDB stores ready");
                Ok(stores)
            }
            Err(e) if core.dev_mode => {
                warn!("MongoDB unavailable (dev mode, using in-memory stores): {}", e);
                Ok(Stores::in_memory())
            }
            Err(e) => {
                error!("MongoDB connection failed: {}", e);
                Err(e)
            }
        }
    }
}

/// Assemble a processor from its parts
pub fn processor_with(
    indexer: Arc<dyn IndexerGateway>,
    stores: Stores,
    schedule: RewardSchedule,
) -> ReputationProcessor {
    ReputationProcessor::new(
        indexer,
        stores.recorder,
        stores.ledger,
        stores.guard,
        Arc::new(schedule),
    )
}

/// Build the production processor for this configuration
pub async fn build_processor(core: &CoreArgs) -> Result<ReputationProcessor> {
    let schedule = core.reward_schedule()?;
    let indexer = Arc::new(GraphQlIndexer::new(core.indexer_config()?)?);
    let stores = Stores::connect(core).await?;
    Ok(processor_with(indexer, stores, schedule))
}
