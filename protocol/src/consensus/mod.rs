//! # Consensus Core
//!
//! A Tendermint-style proof-of-stake BFT engine: stake-weighted proposer
//! rotation, a locking round state machine, vote tallying at a two-thirds
//! threshold, and equivocation evidence leading to slashing.
//!
//! - [`stake_ledger`] — bonded balances, the unbonding queue, accumulated
//!   proposer priority, and slashing.
//! - [`proposer`] — deterministic proposer selection from accumulated power.
//! - [`vote`] / [`proposal`] — signed ballots and block proposals.
//! - [`vote_box`] — per-round vote bookkeeping and equivocation detection.
//! - [`tally`] — stake-weighted quorum counting.
//! - [`evidence`] — equivocation → evidence-transaction wiring.
//! - [`engine`] — the per-height round state machine.
//! - [`staking_api`] — client-facing stake/unstake transaction building.

pub mod engine;
pub mod evidence;
pub mod proposal;
pub mod proposer;
pub mod stake_ledger;
pub mod staking_api;
pub mod tally;
pub mod vote;
pub mod vote_box;

pub use engine::{genesis_chain, ConsensusEngine, RoundPhase};
pub use proposal::Proposal;
pub use proposer::ProposerSelector;
pub use stake_ledger::{StakeLedger, UnstakingEvent};
pub use staking_api::{StakeholderCapability, StakingClient};
pub use tally::{count_votes, TallyResult};
pub use vote::{Phase, Vote};
pub use vote_box::{RecordOutcome, VoteBox};
