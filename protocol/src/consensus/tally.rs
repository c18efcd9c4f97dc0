//! Stake-weighted vote tallying.

use std::collections::HashMap;

use crate::consensus::stake_ledger::StakeLedger;
use crate::consensus::vote::Vote;
use crate::storage::block::NIL_BLOCK_ID;

/// Outcome of tallying a bucket of votes against a stake ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TallyResult {
    /// No `block_id` (including NIL) has crossed the two-thirds threshold
    /// yet.
    NoQuorum,
    /// `block_id` crossed the threshold. `NIL_BLOCK_ID` is a valid winner —
    /// it means the round agreed to move on without committing a block.
    Quorum { block_id: [u8; 32] },
}

/// Sums each caster's bonded stake onto the `block_id` it voted for and
/// checks whether any candidate (including NIL) has strictly more than
/// `floor(2 * total_bonded / 3)`.
///
/// Order-independent: the result depends only on the *set* of votes, not
/// the order they were recorded in. Votes from addresses with no bonded
/// stake (e.g. already slashed) are ignored rather than rejected, since a
/// stale vote from an ejected validator should simply not count.
pub fn count_votes(votes: &[&Vote], ledger: &StakeLedger) -> TallyResult {
    let total_bonded = ledger.total_bonded();
    let threshold = (2 * total_bonded) / 3;

    let mut totals: HashMap<[u8; 32], u64> = HashMap::new();
    for vote in votes {
        let Some(stake) = ledger.stake_balances.get(&vote.from) else {
            continue;
        };
        *totals.entry(vote.block_id).or_insert(0) += stake;
    }

    for (block_id, stake) in &totals {
        if *stake > threshold {
            return TallyResult::Quorum { block_id: *block_id };
        }
    }

    let _ = NIL_BLOCK_ID;
    TallyResult::NoQuorum
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::vote::Phase;
    use crate::crypto::{Address, Keypair};
    use std::collections::BTreeMap;

    fn ledger(stakes: &[(u8, u64)]) -> StakeLedger {
        let map: BTreeMap<Address, u64> = stakes
            .iter()
            .map(|(b, s)| (Address([*b; 32]), *s))
            .collect();
        StakeLedger::genesis(map)
    }

    fn vote_from(addr_seed: u8, height: u64, round: u64, phase: Phase, block_id: [u8; 32]) -> Vote {
        let kp = Keypair::generate();
        let mut v = Vote::new(Address([addr_seed; 32]), height, round, phase, block_id, kp.public_key());
        v.sign(&kp);
        v
    }

    #[test]
    fn quorum_reached_above_two_thirds() {
        let l = ledger(&[(1, 40), (2, 40), (3, 20)]);
        let v1 = vote_from(1, 1, 0, Phase::Prevote, [7u8; 32]);
        let v2 = vote_from(2, 1, 0, Phase::Prevote, [7u8; 32]);
        let v3 = vote_from(3, 1, 0, Phase::Prevote, [7u8; 32]);
        let votes = vec![&v1, &v2, &v3];
        // threshold = floor(200/3) = 66; 100 > 66.
        match count_votes(&votes, &l) {
            TallyResult::Quorum { block_id } => assert_eq!(block_id, [7u8; 32]),
            TallyResult::NoQuorum => panic!("expected quorum"),
        }
    }

    #[test]
    fn exactly_at_threshold_is_not_quorum() {
        // total = 99, threshold = floor(198/3) = 66. A 66-stake block does
        // NOT exceed 66 (strict >).
        let l = ledger(&[(1, 66), (2, 33)]);
        let v1 = vote_from(1, 1, 0, Phase::Prevote, [7u8; 32]);
        let votes = vec![&v1];
        assert_eq!(count_votes(&votes, &l), TallyResult::NoQuorum);
    }

    #[test]
    fn split_votes_yield_no_quorum() {
        let l = ledger(&[(1, 34), (2, 33), (3, 33)]);
        let v1 = vote_from(1, 1, 0, Phase::Prevote, [1u8; 32]);
        let v2 = vote_from(2, 1, 0, Phase::Prevote, [2u8; 32]);
        let v3 = vote_from(3, 1, 0, Phase::Prevote, [3u8; 32]);
        let votes = vec![&v1, &v2, &v3];
        assert_eq!(count_votes(&votes, &l), TallyResult::NoQuorum);
    }

    #[test]
    fn nil_is_a_valid_winning_candidate() {
        let l = ledger(&[(1, 80), (2, 20)]);
        let v1 = vote_from(1, 1, 0, Phase::Prevote, NIL_BLOCK_ID);
        let votes = vec![&v1];
        match count_votes(&votes, &l) {
            TallyResult::Quorum { block_id } => assert_eq!(block_id, NIL_BLOCK_ID),
            TallyResult::NoQuorum => panic!("expected NIL quorum"),
        }
    }

    #[test]
    fn order_independent() {
        let l = ledger(&[(1, 40), (2, 40), (3, 20)]);
        let v1 = vote_from(1, 1, 0, Phase::Prevote, [7u8; 32]);
        let v2 = vote_from(2, 1, 0, Phase::Prevote, [7u8; 32]);
        let v3 = vote_from(3, 1, 0, Phase::Prevote, [7u8; 32]);
        let forward = vec![&v1, &v2, &v3];
        let reversed = vec![&v3, &v2, &v1];
        assert_eq!(count_votes(&forward, &l), count_votes(&reversed, &l));
    }

    #[test]
    fn unbonded_voter_is_ignored() {
        let l = ledger(&[(1, 100)]);
        let v1 = vote_from(99, 1, 0, Phase::Prevote, [7u8; 32]);
        let votes = vec![&v1];
        assert_eq!(count_votes(&votes, &l), TallyResult::NoQuorum);
    }
}
