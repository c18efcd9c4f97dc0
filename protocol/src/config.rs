//! # Protocol Configuration & Constants
//!
//! Every tunable in the consensus engine lives here. If you're hardcoding a
//! round-timing constant somewhere else, you're doing it wrong.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::Address;

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// Major version — bump on breaking consensus changes. A.k.a. hard forks.
pub const PROTOCOL_VERSION_MAJOR: u16 = 0;

/// Minor version — bump on backward-compatible additions.
pub const PROTOCOL_VERSION_MINOR: u16 = 1;

/// The full version string.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// Ed25519 secret key length in bytes.
pub const SIGNING_KEY_LENGTH: usize = 32;

/// Ed25519 public key length in bytes.
pub const VERIFYING_KEY_LENGTH: usize = 32;

/// Ed25519 signature length in bytes.
pub const SIGNATURE_LENGTH: usize = 64;

/// Hash output length in bytes (both BLAKE3 and SHA-256 produce 32-byte digests).
pub const HASH_OUTPUT_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// Consensus Timing
// ---------------------------------------------------------------------------

/// Base phase step delay. The round-r phase timer lasts `r * DELTA`
/// (linear backoff), per the round state machine.
pub const DELTA: Duration = Duration::from_millis(300);

/// Delay after a round's commit votes cross threshold, gathering laggard
/// commits before installing the new head.
pub const COMMIT_TIME: Duration = Duration::from_millis(300);

/// Upper bound on Finalize retally attempts. Each attempt that finds the
/// commit tally still short waits one more `DELTA` for laggard commits
/// before retallying; after this many attempts the round installs the
/// block anyway rather than stalling the height indefinitely.
pub const FINALIZE_MAX_RETRIES: u32 = 5;

/// Number of heights between scheduling an unstake and its release.
pub const UNSTAKE_DELAY: u64 = 35;

// ---------------------------------------------------------------------------
// Fee Parameters
// ---------------------------------------------------------------------------

/// Minimum transaction fee in the chain's smallest unit.
pub const MIN_TX_FEE: u64 = 100;

/// Base fee per byte of transaction data.
pub const FEE_PER_BYTE: u64 = 10;

// ---------------------------------------------------------------------------
// Mempool / Proposal Limits
// ---------------------------------------------------------------------------

/// Default mempool capacity.
pub const DEFAULT_MEMPOOL_CAPACITY: usize = 10_000;

/// Maximum transactions a single block proposal may include.
pub const MAX_TXS_PER_BLOCK: usize = 5_000;

// ---------------------------------------------------------------------------
// Network channel identifiers
// ---------------------------------------------------------------------------

pub use crate::network::broadcast::{
    CHANNEL_BLOCK_PROPOSAL, CHANNEL_COMMIT, CHANNEL_NEW_ROUND, CHANNEL_POST_TRANSACTION,
    CHANNEL_PRECOMMIT, CHANNEL_PREVOTE,
};

// ---------------------------------------------------------------------------
// Genesis configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum GenesisConfigError {
    #[error("genesis config must specify exactly one of starting_stake or starting_stake_map, got neither")]
    MissingStartingStake,

    #[error("genesis config must specify exactly one of starting_stake or starting_stake_map, got both")]
    AmbiguousStartingStake,
}

/// Initial validator set supplied to a fresh chain.
///
/// Exactly one of `starting_stake` or `starting_stake_map` must be present.
/// Both keyed forms resolve to the same shape (`Address -> amount`) — the
/// dual fields exist only because the host platform may supply either a
/// raw address map or a map keyed by client handle that the caller has
/// already resolved to addresses before constructing this struct.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenesisConfig {
    pub starting_stake: Option<BTreeMap<Address, u64>>,
    pub starting_stake_map: Option<BTreeMap<Address, u64>>,
}

impl GenesisConfig {
    /// Validates the exactly-one-present invariant and returns the
    /// resolved `Address -> amount` map.
    pub fn resolve(&self) -> Result<BTreeMap<Address, u64>, GenesisConfigError> {
        match (&self.starting_stake, &self.starting_stake_map) {
            (Some(_), Some(_)) => Err(GenesisConfigError::AmbiguousStartingStake),
            (None, None) => Err(GenesisConfigError::MissingStartingStake),
            (Some(m), None) | (None, Some(m)) => Ok(m.clone()),
        }
    }
}
