//! Stake-weighted deterministic proposer selection.
//!
//! Every bonded validator accumulates "power" each height in proportion to
//! its stake. The validator with the strictly greatest accumulated power
//! proposes; ties (which only arise from identical stake histories) break
//! lexicographically on address so every honest node computes the same
//! winner without a round of communication.

use crate::consensus::stake_ledger::StakeLedger;
use crate::crypto::Address;

pub struct ProposerSelector;

impl ProposerSelector {
    /// Picks the proposer for the ledger's current height: the bonded
    /// address with the greatest `accum_power`, lexicographically
    /// tie-broken. Returns `None` if no address is bonded.
    pub fn select(ledger: &StakeLedger) -> Option<Address> {
        ledger
            .accum_power
            .iter()
            .filter(|(addr, _)| ledger.stake_balances.contains_key(addr))
            .max_by(|(addr_a, power_a), (addr_b, power_b)| {
                power_a.cmp(power_b).then_with(|| addr_a.cmp(addr_b))
            })
            .map(|(addr, _)| *addr)
    }

    /// Selects the proposer and applies the accumulated-power update for
    /// the block they propose, returning the selected address. This is the
    /// entry point the round state machine calls once per height.
    pub fn select_and_advance(ledger: &mut StakeLedger) -> Option<Address> {
        let proposer = Self::select(ledger)?;
        ledger.update_accum_power(proposer);
        Some(proposer)
    }
}
