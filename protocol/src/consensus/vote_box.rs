//! Per-round vote bookkeeping and equivocation detection.

use std::collections::HashMap;

use crate::consensus::vote::{Phase, Vote};
use crate::crypto::Address;

fn phase_tag(phase: Phase) -> u8 {
    match phase {
        Phase::Prevote => 0,
        Phase::Precommit => 1,
        Phase::Commit => 2,
    }
}

/// Result of attempting to record an incoming vote.
#[derive(Debug)]
pub enum RecordOutcome {
    /// First sighting of this `(height, round, phase, from)` ballot.
    Accepted,
    /// The vote failed freshness/signature validation against the box's
    /// current `(height, round)`.
    Stale,
    /// An identical vote (same block_id) from this caster was already on
    /// file; harmless re-delivery.
    Duplicate,
    /// The caster already voted for a *different* block_id in the same
    /// `(height, round, phase)` — a double-vote. Carries both ballots so
    /// the caller can build an evidence transaction.
    Equivocation { first: Vote, second: Vote },
}

/// Collects votes for the validator set's current height, keyed by
/// `(height, round, phase, from)` so a round transition never loses
/// earlier-round commit votes (the carry-over rule lives in
/// [`Vote::is_valid`]).
#[derive(Default)]
pub struct VoteBox {
    votes: HashMap<(u64, u64, u8, Address), Vote>,
}

impl VoteBox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates `vote` against the engine's current `(height, round)` and
    /// records it, detecting duplicates and equivocation.
    pub fn record(&mut self, vote: Vote, current_height: u64, current_round: u64) -> RecordOutcome {
        if !vote.is_valid(current_height, current_round) {
            return RecordOutcome::Stale;
        }

        let key = (vote.height, vote.round, phase_tag(vote.phase), vote.from);
        match self.votes.get(&key) {
            None => {
                self.votes.insert(key, vote);
                RecordOutcome::Accepted
            }
            Some(existing) if existing.block_id == vote.block_id => RecordOutcome::Duplicate,
            Some(existing) => RecordOutcome::Equivocation {
                first: existing.clone(),
                second: vote,
            },
        }
    }

    /// All votes on file for a given `(height, round, phase)`, for tallying.
    pub fn votes_for(&self, height: u64, round: u64, phase: Phase) -> Vec<&Vote> {
        let tag = phase_tag(phase);
        self.votes
            .iter()
            .filter(|((h, r, p, _), _)| *h == height && *r == round && *p == tag)
            .map(|(_, v)| v)
            .collect()
    }

    /// Commit-phase votes on file for `height`, from any round.
    ///
    /// A validator that already saw enough Commit votes for a block in an
    /// earlier round of this height doesn't need its peers to resend
    /// equivalent prevotes/precommits in the current round — those commits
    /// carry over (see [`Vote::is_valid`]) and should count toward the
    /// current round's quorum too.
    pub fn commit_votes_for_height(&self, height: u64) -> Vec<&Vote> {
        self.votes
            .iter()
            .filter(|((h, _, p, _), _)| *h == height && *p == phase_tag(Phase::Commit))
            .map(|(_, v)| v)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.votes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }
}
