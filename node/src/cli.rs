//! # CLI Interface
//!
//! Defines the command-line argument structure for `quorum-node` using
//! `clap` derive. The binary drives an in-process devnet: every validator
//! keypair, its consensus task, and the broadcast fabric connecting them
//! all live in the same process, so there is no RPC/P2P port surface to
//! configure here.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// QUORUM consensus devnet driver.
///
/// Spins up an in-process set of validators, runs the round state machine
/// for a fixed number of heights, and prints each committed block.
#[derive(Parser, Debug)]
#[command(
    name = "quorum-node",
    about = "QUORUM consensus devnet driver",
    version,
    propagate_version = true
)]
pub struct QuorumNodeCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the devnet driver binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run an in-process devnet for a fixed number of heights.
    Run(RunArgs),
    /// Generate a validator keypair and print it (hex-encoded).
    Keygen,
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Number of validators to spin up, each with equal starting stake.
    #[arg(long, env = "QUORUM_VALIDATORS", default_value_t = 4)]
    pub validators: usize,

    /// Starting stake per validator.
    #[arg(long, env = "QUORUM_STAKE", default_value_t = 1_000)]
    pub stake: u64,

    /// Number of block heights to run before exiting.
    #[arg(long, env = "QUORUM_HEIGHTS", default_value_t = 10)]
    pub heights: u64,

    /// Log verbosity: error, warn, info, debug, or trace.
    #[arg(long, env = "QUORUM_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Optional path to write a JSON summary of the run (heights, block
    /// hashes, validator set) once it completes.
    #[arg(long)]
    pub summary_out: Option<PathBuf>,
}
