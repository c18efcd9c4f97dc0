//! Turning a detected equivocation into a verifiable evidence transaction.

use crate::consensus::vote::Vote;
use crate::crypto::{address_of, Address, PublicKey, Signature};
use crate::transaction::{EvidenceMessage, TransactionBuilder};

/// Captures a signed vote as an [`EvidenceMessage`], independently
/// re-verifiable without the live [`crate::consensus::vote_box::VoteBox`].
pub fn evidence_message_from_vote(vote: &Vote) -> Option<EvidenceMessage> {
    let sig = vote.sig.as_ref()?;
    Some(EvidenceMessage {
        height: vote.height,
        round: vote.round,
        id: vote.id(),
        block_id: vote.block_id,
        pub_key_hex: vote.pub_key.to_hex(),
        sig_hex: sig.to_hex(),
    })
}

/// Independently re-verifies that `msg` really is a signed statement by
/// `expected_signer` attesting to `msg.block_id` at `(msg.height, msg.round)`.
///
/// This does not need the original [`Vote`] struct — only what survives
/// into the [`EvidenceMessage`] — since the signature covers the identity
/// hash and the identity hash is recomputed the same way a [`Vote`]'s is.
pub fn verify_evidence_message(msg: &EvidenceMessage, expected_signer: Address) -> bool {
    let Ok(pub_key) = PublicKey::from_hex(&msg.pub_key_hex) else {
        return false;
    };
    let Ok(sig) = Signature::from_hex(&msg.sig_hex) else {
        return false;
    };
    if address_of(&pub_key) != expected_signer {
        return false;
    }
    pub_key.verify(&msg.id, &sig)
}

/// Full validity of an Evidence transaction's payload: both messages verify
/// against `byzantine_player`, were cast at the same `(height, round)`, and
/// attest to two *different* block IDs (otherwise there is no
/// equivocation, just a re-delivered identical vote).
pub fn verify_evidence(
    byzantine_player: Address,
    msg1: &EvidenceMessage,
    msg2: &EvidenceMessage,
) -> bool {
    if msg1.height != msg2.height || msg1.round != msg2.round {
        return false;
    }
    if msg1.block_id == msg2.block_id {
        return false;
    }
    if msg1.id == msg2.id {
        return false;
    }
    verify_evidence_message(msg1, byzantine_player) && verify_evidence_message(msg2, byzantine_player)
}

/// Builds an unsigned Evidence transaction reporting `byzantine_player`
/// for the two conflicting votes captured in `first`/`second`.
pub fn build_evidence_transaction(
    reporter: Address,
    byzantine_player: Address,
    first: &Vote,
    second: &Vote,
) -> Option<TransactionBuilder> {
    let msg1 = evidence_message_from_vote(first)?;
    let msg2 = evidence_message_from_vote(second)?;
    Some(TransactionBuilder::evidence(reporter, byzantine_player, msg1, msg2))
}
