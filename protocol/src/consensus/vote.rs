//! Signed ballots cast during a consensus round.

use serde::{Deserialize, Serialize};

use crate::crypto::hash::blake3_hash;
use crate::crypto::{Address, PublicKey, Signature};

/// Which phase of the round state machine a vote was cast in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Prevote,
    Precommit,
    Commit,
}

/// A signed ballot for a specific `(height, round, phase, block_id)`.
///
/// Identity is the BLAKE3 hash of every field except `sig` — see
/// [`Vote::id`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub from: Address,
    pub height: u64,
    pub round: u64,
    pub phase: Phase,
    pub block_id: [u8; 32],
    pub pub_key: PublicKey,
    pub sig: Option<Signature>,
}

impl Vote {
    /// Constructs an unsigned vote.
    pub fn new(from: Address, height: u64, round: u64, phase: Phase, block_id: [u8; 32], pub_key: PublicKey) -> Self {
        Self {
            from,
            height,
            round,
            phase,
            block_id,
            pub_key,
            sig: None,
        }
    }

    /// The canonical bytes identity is computed over — every field except
    /// `sig`.
    fn signable_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(96);
        buf.extend_from_slice(self.from.as_bytes());
        buf.extend_from_slice(&self.height.to_le_bytes());
        buf.extend_from_slice(&self.round.to_le_bytes());
        buf.push(match self.phase {
            Phase::Prevote => 0,
            Phase::Precommit => 1,
            Phase::Commit => 2,
        });
        buf.extend_from_slice(&self.block_id);
        buf.extend_from_slice(self.pub_key.as_bytes());
        buf
    }

    /// Identity hash of this vote: `blake3(signable_bytes)`. Two votes with
    /// the same identity are the same vote, regardless of signature bytes.
    pub fn id(&self) -> [u8; 32] {
        blake3_hash(&self.signable_bytes())
    }

    /// Signs the vote in place with the caster's keypair.
    pub fn sign(&mut self, keypair: &crate::crypto::Keypair) {
        let bytes = self.signable_bytes();
        self.sig = Some(keypair.sign(&bytes));
    }

    /// Structural and cryptographic validity:
    /// - `sig` verifies against `pub_key` over the signable bytes.
    /// - `from` is the address derived from `pub_key`.
    pub fn has_valid_signature(&self) -> bool {
        let Some(sig) = &self.sig else {
            return false;
        };
        if crate::crypto::address_of(&self.pub_key) != self.from {
            return false;
        }
        self.pub_key.verify(&self.signable_bytes(), sig)
    }

    /// Full validity check against the engine's current `(height, round)`.
    ///
    /// A vote is *stale* — and therefore invalid — if it is for an earlier
    /// height, or for an earlier round of the current height with a
    /// non-Commit phase. Commit votes remain valid across subsequent
    /// rounds of the same height (the commit carry-over rule).
    pub fn is_valid(&self, current_height: u64, current_round: u64) -> bool {
        if !self.has_valid_signature() {
            return false;
        }
        if self.height < current_height {
            return false;
        }
        if self.height == current_height && self.round < current_round && self.phase != Phase::Commit {
            return false;
        }
        true
    }

    /// Lexicographic compare on `(height, round)` — `true` iff `self` is
    /// strictly more recent than `other`.
    pub fn fresher_than(&self, other: &Vote) -> bool {
        (self.height, self.round) > (other.height, other.round)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;

    fn make_vote(kp: &Keypair, height: u64, round: u64, phase: Phase, block_id: [u8; 32]) -> Vote {
        let mut v = Vote::new(kp.address(), height, round, phase, block_id, kp.public_key());
        v.sign(kp);
        v
    }

    #[test]
    fn signed_vote_has_valid_signature() {
        let kp = Keypair::generate();
        let v = make_vote(&kp, 1, 0, Phase::Prevote, [1u8; 32]);
        assert!(v.has_valid_signature());
    }

    #[test]
    fn unsigned_vote_invalid() {
        let kp = Keypair::generate();
        let v = Vote::new(kp.address(), 1, 0, Phase::Prevote, [1u8; 32], kp.public_key());
        assert!(!v.has_valid_signature());
    }

    #[test]
    fn tampered_vote_invalid() {
        let kp = Keypair::generate();
        let mut v = make_vote(&kp, 1, 0, Phase::Prevote, [1u8; 32]);
        v.block_id = [2u8; 32];
        assert!(!v.has_valid_signature());
    }

    #[test]
    fn stale_height_is_invalid() {
        let kp = Keypair::generate();
        let v = make_vote(&kp, 1, 0, Phase::Prevote, [1u8; 32]);
        assert!(!v.is_valid(2, 0));
    }

    #[test]
    fn stale_round_non_commit_is_invalid() {
        let kp = Keypair::generate();
        let v = make_vote(&kp, 5, 1, Phase::Prevote, [1u8; 32]);
        assert!(!v.is_valid(5, 2));
    }

    #[test]
    fn stale_round_commit_still_valid() {
        let kp = Keypair::generate();
        let v = make_vote(&kp, 5, 1, Phase::Commit, [1u8; 32]);
        assert!(v.is_valid(5, 2));
    }

    #[test]
    fn fresher_than_compares_height_then_round() {
        let kp = Keypair::generate();
        let a = make_vote(&kp, 2, 0, Phase::Prevote, [1u8; 32]);
        let b = make_vote(&kp, 1, 5, Phase::Prevote, [1u8; 32]);
        assert!(a.fresher_than(&b));

        let c = make_vote(&kp, 1, 2, Phase::Prevote, [1u8; 32]);
        let d = make_vote(&kp, 1, 1, Phase::Prevote, [1u8; 32]);
        assert!(c.fresher_than(&d));
    }

    #[test]
    fn id_excludes_signature() {
        let kp = Keypair::generate();
        let v1 = make_vote(&kp, 1, 0, Phase::Prevote, [1u8; 32]);
        let mut v2 = Vote::new(kp.address(), 1, 0, Phase::Prevote, [1u8; 32], kp.public_key());
        v2.sign(&kp);
        assert_eq!(v1.id(), v2.id());
    }

    #[test]
    fn different_block_ids_differ_in_identity() {
        let kp = Keypair::generate();
        let v1 = make_vote(&kp, 1, 0, Phase::Prevote, [1u8; 32]);
        let v2 = make_vote(&kp, 1, 0, Phase::Prevote, [2u8; 32]);
        assert_ne!(v1.id(), v2.id());
    }
}
