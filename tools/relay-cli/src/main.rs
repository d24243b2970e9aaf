//! relay-cli: Nexus relay operator tool
//!
//! Inspects the configured registry and queries chains and the aggregation
//! service without submitting anything on-chain.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use nexus_relay::algorithms::encode_proof;
use nexus_relay::domain::hex::{parse_hash, to_hex};
use nexus_relay::{
    calculate_storage_slot, AccountStateSource, ChainEntry, HttpProofRpc, NexusStateClient,
    RelayConfig, RpcDialect, StorageProofProvider, MESSAGES_MAPPING_SLOT,
};
use relay_telemetry::{init_logging, log_event, log_relay_event, TelemetryConfig};

/// relay-cli: Nexus relay operator tool
#[derive(Parser, Debug)]
#[command(name = "relay-cli")]
#[command(about = "Inspect the relay registry and query proofs and Nexus state")]
struct Args {
    /// Relay config file
    #[arg(short, long, default_value = "relay.toml")]
    config: PathBuf,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List registered chains
    Chains,

    /// Derive the storage slot of a receipt digest
    Slot {
        /// Receipt digest (32-byte hex)
        #[arg(long)]
        digest: String,

        /// Messages mapping slot
        #[arg(long, default_value_t = MESSAGES_MAPPING_SLOT)]
        mapping_slot: u64,
    },

    /// Query the aggregation service for an app's account state
    AccountState {
        /// Nexus app account id (hex, with or without 0x)
        #[arg(long)]
        app: String,
    },

    /// Fetch a storage proof from an app's mailbox and print the wire tuple
    Proof {
        /// Registered app id
        #[arg(long)]
        app: String,

        /// Storage key (32-byte hex)
        #[arg(long)]
        key: String,

        /// Height to prove at; latest minus the configured offset if omitted
        #[arg(long)]
        height: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&TelemetryConfig::for_service("relay-cli").verbose(args.verbose))?;

    let config = RelayConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;

    match args.command {
        Command::Chains => list_chains(&config),
        Command::Slot {
            digest,
            mapping_slot,
        } => print_slot(&digest, mapping_slot),
        Command::AccountState { app } => account_state(&config, &app).await,
        Command::Proof { app, key, height } => proof(&config, &app, &key, height).await,
    }
}

fn describe(entry: &ChainEntry) -> String {
    let address = |a: Option<[u8; 20]>| a.map(|a| to_hex(&a)).unwrap_or_else(|| "-".into());
    format!(
        "{:<20} {:<13} chain {:<10} mailbox {} state-manager {} rpc {}",
        entry.app_id,
        entry.kind.to_string(),
        entry.native_chain_id,
        address(entry.mailbox_contract),
        address(entry.state_manager_contract),
        entry.rpc_endpoint
    )
}

fn list_chains(config: &RelayConfig) -> Result<()> {
    let registry = config.build_registry()?;
    log_event!(debug, "cli", "listing chains", count = registry.len());
    for entry in registry.list() {
        println!("{}", describe(&entry));
    }
    Ok(())
}

fn print_slot(digest: &str, mapping_slot: u64) -> Result<()> {
    let digest = parse_hash(digest).context("digest must be 32 bytes of hex")?;
    println!("{}", to_hex(&calculate_storage_slot(&digest, mapping_slot)));
    Ok(())
}

async fn account_state(config: &RelayConfig, app: &str) -> Result<()> {
    let client = NexusStateClient::new(&config.nexus_url)?;
    let response = client.get_account_state(app).await?;
    log_relay_event!(
        info,
        "cli",
        "account state fetched",
        app,
        response.chain_state_number
    );
    let json = serde_json::json!({
        "chain_state_number": response.chain_state_number,
        "state_root": to_hex(&response.state_root),
        "nexus_height": response.nexus_header.number,
        "account": response.account,
        "proof": response.proof.iter().map(|p| to_hex(p)).collect::<Vec<_>>(),
        "value_hash": to_hex(&response.value_hash),
    });
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

async fn proof(config: &RelayConfig, app: &str, key: &str, height: Option<u64>) -> Result<()> {
    let chain = config.chain(app)?;
    let entry = chain.to_entry()?;
    let mailbox = entry
        .mailbox_contract
        .with_context(|| format!("{} has no mailbox contract", app))?;
    let key = parse_hash(key).context("key must be 32 bytes of hex")?;

    let rpc = HttpProofRpc::new(&entry.rpc_endpoint, RpcDialect::for_kind(entry.kind))?;
    let provider = StorageProofProvider::new(
        Arc::new(rpc),
        entry.kind,
        chain.verifier_options().block_query_offset,
    );
    let proof = provider.get_proof(mailbox, key, height).await?;
    log_relay_event!(info, "cli", "proof fetched", app, proof.at_height);

    let encoded = encode_proof(&proof, proof.at_height, provider.layout());
    println!("height  {}", proof.at_height);
    println!("value   {}", to_hex(&proof.value));
    println!("encoded {}", encoded.to_hex());
    Ok(())
}
