// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # quorum-node
//!
//! An in-process devnet driver for the QUORUM consensus core. Spins up N
//! validators sharing one genesis stake distribution and one in-memory
//! broadcast fabric, then runs each validator's [`ConsensusEngine`] as its
//! own task for a fixed number of heights, logging every committed block.
//!
//! There is no RPC surface, no P2P transport, and no durable storage here —
//! all of that lives outside this binary's scope. What you get is a
//! faithful run of the round state machine across real `tokio` tasks
//! talking over real (in-process) channels, useful for exercising proposer
//! rotation, locking, and slashing without standing up a real network.

mod cli;
mod logging;
mod metrics;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use serde::Serialize;
use tracing::{error, info};

use quorum_protocol::config::{GenesisConfig, MAX_TXS_PER_BLOCK};
use quorum_protocol::consensus::{genesis_chain, ConsensusEngine};
use quorum_protocol::crypto::{Address, Keypair};
use quorum_protocol::network::{ChannelNetwork, TxPool};

use cli::{Commands, QuorumNodeCli, RunArgs};
use logging::{init_logging, LogFormat};
use metrics::NodeMetrics;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = QuorumNodeCli::parse();

    match cli.command {
        Commands::Run(args) => {
            init_logging(&args.log_level, LogFormat::Pretty);
            run_devnet(args).await
        }
        Commands::Keygen => {
            let keypair = Keypair::generate();
            println!("address:     {}", keypair.address().to_hex());
            println!("public_key:  {}", keypair.public_key_hex());
            println!("secret_key:  {}", hex::encode(keypair.secret_key_bytes()));
            Ok(())
        }
        Commands::Version => {
            println!(
                "quorum-node {} ({})",
                env!("CARGO_PKG_VERSION"),
                quorum_protocol::config::PROTOCOL_VERSION
            );
            Ok(())
        }
    }
}

/// One validator's committed block, recorded for the end-of-run summary.
#[derive(Debug, Serialize)]
struct CommittedBlockRecord {
    height: u64,
    hash: String,
    tx_count: usize,
    validator: String,
}

#[derive(Debug, Serialize)]
struct RunSummary {
    validators: usize,
    heights: u64,
    blocks: Vec<CommittedBlockRecord>,
}

async fn run_devnet(args: RunArgs) -> anyhow::Result<()> {
    if args.validators == 0 {
        anyhow::bail!("--validators must be at least 1");
    }

    let metrics = Arc::new(NodeMetrics::new());
    let keypairs: Vec<Keypair> = (0..args.validators).map(|_| Keypair::generate()).collect();

    let mut starting_stake: BTreeMap<Address, u64> = BTreeMap::new();
    for kp in &keypairs {
        starting_stake.insert(kp.address(), args.stake);
    }
    let genesis = GenesisConfig {
        starting_stake: Some(starting_stake.clone()),
        starting_stake_map: None,
    };
    let resolved_stake = genesis.resolve()?;

    info!(
        validators = args.validators,
        stake_per_validator = args.stake,
        heights = args.heights,
        "starting devnet"
    );

    let network = Arc::new(ChannelNetwork::new());
    let mut handles = Vec::with_capacity(keypairs.len());

    for kp in keypairs {
        let address = kp.address();
        let inbox = network.register(&address.to_hex(), 256);
        let chain = genesis_chain(resolved_stake.clone());
        let mempool = TxPool::new(MAX_TXS_PER_BLOCK * 2);
        let mut engine = ConsensusEngine::new(kp, chain, mempool, network.clone(), inbox);
        let heights = args.heights;
        let metrics = metrics.clone();

        handles.push(tokio::spawn(async move {
            let mut records = Vec::with_capacity(heights as usize);
            for _ in 0..heights {
                let started = Instant::now();
                let block = engine.run_height().await;
                metrics.blocks_processed_total.inc();
                metrics
                    .transactions_processed_total
                    .inc_by(block.tx_count() as u64);
                metrics.block_height.set(block.height() as i64);
                metrics
                    .block_commit_latency_seconds
                    .observe(started.elapsed().as_secs_f64());

                info!(
                    height = block.height(),
                    hash = %block.hash_hex(),
                    txs = block.tx_count(),
                    validator = %address.to_hex(),
                    "committed block"
                );
                records.push(CommittedBlockRecord {
                    height: block.height(),
                    hash: block.hash_hex(),
                    tx_count: block.tx_count(),
                    validator: address.to_hex(),
                });
            }
            records
        }));
    }

    let mut all_records = Vec::new();
    for handle in handles {
        match handle.await {
            Ok(records) => all_records.extend(records),
            Err(e) => error!("validator task panicked: {}", e),
        }
    }

    info!(metric_lines = metrics.encode().unwrap_or_default().lines().count(), "run complete");
    if let Some(path) = &args.summary_out {
        write_summary(path, args.validators, args.heights, all_records)?;
    }

    Ok(())
}

fn write_summary(
    path: &Path,
    validators: usize,
    heights: u64,
    blocks: Vec<CommittedBlockRecord>,
) -> anyhow::Result<()> {
    let summary = RunSummary {
        validators,
        heights,
        blocks,
    };
    let json = serde_json::to_string_pretty(&summary)?;
    std::fs::write(path, json)?;
    Ok(())
}
