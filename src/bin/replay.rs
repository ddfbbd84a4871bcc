//! Repute replay - run a single governance event by hand
//!
//! Usage:
//!   repute-replay tipped --network kusama --index 0x8a3f... --kind Tip --address H4Ztb...
//!   repute-replay decision-deposit --network polkadot --index 512 --kind ReferendumV2 \
//!       --address 15oF4... --dry-run
//!
//! The event goes through the same processor as the worker and the outcome
//! is printed as JSON. `--dry-run` swaps the MongoDB stores for in-memory
//! ones; `--publish` hands the event to the worker over NATS instead.

use clap::{Parser, Subcommand};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use repute::{
    config::{CoreArgs, NatsArgs},
    indexer::GraphQlIndexer,
    logging::{self, LogOutput},
    nats::NatsClient,
    services::{self, Stores},
    types::{
        DecisionDepositPlaced, EventEnvelope, PostId, ProposalCreated, ProposalKind,
        ReputationEvent, Tipped,
    },
    worker::event_subject,
};

#[derive(Parser, Debug)]
#[command(name = "repute-replay")]
#[command(about = "Process one governance event and print the outcome")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Use in-memory stores; nothing is persisted
    #[arg(long, global = true, conflicts_with = "publish")]
    dry_run: bool,

    /// Publish the event to the worker stream instead of processing it here
    #[arg(long, global = true)]
    publish: bool,

    #[command(flatten)]
    nats: NatsArgs,

    #[command(flatten)]
    core: CoreArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// A proposal was created
    ProposalCreated(EventArgs),
    /// A decision deposit was placed
    DecisionDeposit(EventArgs),
    /// A tip was endorsed
    Tipped(EventArgs),
}

#[derive(clap::Args, Debug)]
struct EventArgs {
    /// Network name as configured in INDEXER_URLS
    #[arg(long)]
    network: String,

    /// Proposal index, or `0x` hash for hash-keyed posts
    #[arg(long)]
    index: PostId,

    /// Proposal kind, store or indexer spelling
    #[arg(long)]
    kind: ProposalKind,

    /// Acting account (proposer, depositor or tipper)
    #[arg(long)]
    address: String,
}

impl Command {
    fn into_event(self) -> ReputationEvent {
        match self {
            Command::ProposalCreated(a) => ReputationEvent::ProposalCreated(ProposalCreated {
                network: a.network,
                proposal_index: a.index,
                proposal_kind: a.kind,
                proposer: a.address,
            }),
            Command::DecisionDeposit(a) => {
                ReputationEvent::DecisionDepositPlaced(DecisionDepositPlaced {
                    network: a.network,
                    proposal_index: a.index,
                    proposal_kind: a.kind,
                    depositor: a.address,
                })
            }
            Command::Tipped(a) => ReputationEvent::Tipped(Tipped {
                network: a.network,
                proposal_index: a.index,
                proposal_kind: a.kind,
                tipper: a.address,
            }),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    logging::init(&cli.core, LogOutput::Stderr);
    cli.core.validate()?;

    let event = cli.command.into_event();

    if cli.publish {
        let envelope = EventEnvelope {
            event_id: Some(uuid::Uuid::new_v4().to_string()),
            event,
        };
        let subject = event_subject(&envelope.event);
        let nats = NatsClient::new(&cli.nats, "repute-replay").await?;
        nats.publish_event(&subject, &envelope).await?;
        info!(subject = %subject, "Event published");
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({ "published": subject, "envelope": envelope }))?
        );
        return Ok(());
    }

    let processor = if cli.dry_run {
        info!("Dry run: using in-memory stores");
        services::processor_with(
            Arc::new(GraphQlIndexer::new(cli.core.indexer_config()?)?),
            Stores::in_memory(),
            cli.core.reward_schedule()?,
        )
    } else {
        services::build_processor(&cli.core).await?
    };

    let outcome = processor.process(&event).await?;
    println!(
        "{}",
        serde_json::to_string_pretty(&json!({ "event": event, "outcome": outcome }))?
    );

    Ok(())
}
