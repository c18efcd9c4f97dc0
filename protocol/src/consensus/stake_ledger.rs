//! The staking ledger embedded in every block.
//!
//! Bonded balances, the delayed unbonding queue, accumulated proposer
//! priority, and equivocation slashing with proportional redistribution.
//! Constructing a child ledger for a new block deep-copies the parent's
//! three maps rather than using a persistent/structurally-shared map — a
//! plain clone is the simplest form that honors the copy-on-write
//! semantics without adding a dependency nothing else in the codebase
//! needs.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::config::UNSTAKE_DELAY;
use crate::crypto::Address;

/// A single pending unbonding release: `amount` returns to liquid use once
/// its scheduled height arrives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnstakingEvent {
    pub addr: Address,
    pub amount: u64,
}

/// Bonded balances, unbonding schedule, and proposer-priority accumulator
/// for a single block. Copy-on-write from the parent block's ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeLedger {
    /// Height this ledger belongs to. Needed so `unstake` can compute the
    /// scheduled release height (`height + UNSTAKE_DELAY`).
    pub height: u64,
    pub stake_balances: BTreeMap<Address, u64>,
    pub unstaking_events: BTreeMap<u64, Vec<UnstakingEvent>>,
    pub accum_power: BTreeMap<Address, i64>,
    /// Unordered pairs of evidence message IDs already slashed, so the same
    /// equivocation cannot be slashed twice if multiple validators submit
    /// the same evidence.
    pub slashed_pairs: BTreeSet<([u8; 32], [u8; 32])>,
}

impl StakeLedger {
    /// Builds the genesis ledger: every address in `starting_stake`
    /// receives that amount in both `stake_balances` and `accum_power`.
    pub fn genesis(starting_stake: BTreeMap<Address, u64>) -> Self {
        let accum_power = starting_stake
            .iter()
            .map(|(addr, amount)| (*addr, *amount as i64))
            .collect();
        Self {
            height: 0,
            stake_balances: starting_stake,
            unstaking_events: BTreeMap::new(),
            accum_power,
            slashed_pairs: BTreeSet::new(),
        }
    }

    /// Deep-copies this ledger for a child block at `new_height`, then
    /// drains and applies any unstaking events scheduled to mature at that
    /// height.
    pub fn child_for_height(&self, new_height: u64) -> Self {
        let mut child = self.clone();
        child.height = new_height;
        child.advance(new_height);
        child
    }

    /// Drains `unstaking_events[height]`, subtracting each event's amount
    /// from the corresponding bonded balance. An event whose address is no
    /// longer bonded (slashed between scheduling and release) is silently
    /// skipped.
    fn advance(&mut self, height: u64) {
        let Some(events) = self.unstaking_events.remove(&height) else {
            return;
        };
        for event in events {
            if let Some(balance) = self.stake_balances.get_mut(&event.addr) {
                *balance = balance.saturating_sub(event.amount);
            }
        }
    }

    /// Bonds `amount` from `addr`.
    pub fn stake(&mut self, addr: Address, amount: u64) {
        *self.stake_balances.entry(addr).or_insert(0) += amount;
    }

    /// Schedules release of `amount` at `height + UNSTAKE_DELAY`. The funds
    /// remain bonded (and count for voting and slashing) until release.
    pub fn unstake(&mut self, addr: Address, amount: u64) {
        let release_height = self.height + UNSTAKE_DELAY;
        self.unstaking_events
            .entry(release_height)
            .or_default()
            .push(UnstakingEvent { addr, amount });
    }

    /// Records an equivocation's `(id1, id2)` pair as slashed, returning
    /// `true` if it was not already recorded (i.e. this call should
    /// proceed to slash) or `false` if it was a duplicate submission.
    pub fn record_slashed_pair(&mut self, id1: [u8; 32], id2: [u8; 32]) -> bool {
        let pair = if id1 <= id2 { (id1, id2) } else { (id2, id1) };
        self.slashed_pairs.insert(pair)
    }

    /// Ejects `cheater` from `stake_balances`, `accum_power`, and any future
    /// `unstaking_events`. The seized stake is redistributed among
    /// remaining bonded validators proportional to their current
    /// `stake_balances`; floor-division residue is burned. Returns `false`
    /// (no-op) if `cheater` was not bonded.
    pub fn slash(&mut self, cheater: Address) -> bool {
        let Some(seized) = self.stake_balances.remove(&cheater) else {
            return false;
        };
        self.accum_power.remove(&cheater);
        for events in self.unstaking_events.values_mut() {
            events.retain(|e| e.addr != cheater);
        }

        let total_bonded: u64 = self.stake_balances.values().sum();
        if total_bonded == 0 || seized == 0 {
            return true;
        }

        let shares: Vec<(Address, u64)> = self
            .stake_balances
            .iter()
            .map(|(addr, stake)| {
                let share = (seized as u128 * *stake as u128 / total_bonded as u128) as u64;
                (*addr, share)
            })
            .collect();
        for (addr, share) in shares {
            if share > 0 {
                *self.stake_balances.entry(addr).or_insert(0) += share;
            }
        }

        true
    }

    /// Applied exactly once per committed block (or per round-local copy —
    /// see [`crate::consensus::proposer`]). For each bonded validator,
    /// `accum_power[a] += stake_balances[a]`; then the winning proposer's
    /// power is reduced by the total bonded stake. Net change is zero.
    pub fn update_accum_power(&mut self, proposer: Address) {
        let total_bonded: i64 = self.stake_balances.values().map(|&v| v as i64).sum();
        for (addr, stake) in &self.stake_balances {
            *self.accum_power.entry(*addr).or_insert(0) += *stake as i64;
        }
        *self.accum_power.entry(proposer).or_insert(0) -= total_bonded;
    }

    pub fn total_bonded(&self) -> u64 {
        self.stake_balances.values().sum()
    }
}
