// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Quorum Protocol — Core Library
//!
//! The core of a Tendermint-style proof-of-stake Byzantine fault-tolerant
//! consensus engine: the per-round state machine, stake-weighted proposer
//! selection, the embedded staking ledger, and vote collection/tallying.
//!
//! ## Architecture
//!
//! - **crypto** — Ed25519 signing, BLAKE3/SHA-256 hashing, address
//!   derivation. The concrete realization of the host platform's
//!   `hash`/`sign`/`verify`/`addressOf` contract.
//! - **transaction** — Tagged transaction payloads (Transfer, Stake,
//!   Unstake, Evidence), construction, signing, and verification.
//! - **storage** — The `Block`/`Chain` shape the consensus core runs
//!   against: balances, the embedded stake ledger, hashing.
//! - **network** — In-process broadcast fabric and fee-priority mempool.
//! - **consensus** — The round state machine, proposer selection, vote
//!   tallying, equivocation evidence, and the client-facing staking API.
//! - **config** — Protocol constants and genesis configuration.
//!
//! ## Design Philosophy
//!
//! 1. Correctness over performance (but we're still fast).
//! 2. No unsafe code in crypto paths — we sleep at night.
//! 3. Every public API is documented.
//! 4. If it touches stake, it has tests. Plural.

pub mod config;
pub mod consensus;
pub mod crypto;
pub mod network;
pub mod storage;
pub mod transaction;
