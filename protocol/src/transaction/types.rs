//! Core type definitions for consensus-core transactions.
//!
//! These types form the vocabulary of every transaction the engine applies
//! to a block. The payload is a tagged variant rather than a dynamic
//! `{type: string, ...}` blob — see the module doc for the rationale.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::crypto::Address;

/// A monetary amount in the chain's native unit ("gold"). Always an
/// integer — no floating point anywhere near stake or balances.
pub type Amount = u64;

// ---------------------------------------------------------------------------
// TransactionPayload
// ---------------------------------------------------------------------------

/// A single piece of equivocation evidence: enough of a signed message to
/// re-verify its authenticity independent of any live VoteBox.
///
/// Evidence may cite two conflicting votes (the common case — see scenario
/// S4) or two conflicting proposals from the same proposer at the same
/// (height, round). Either way we only need the fields required to replay
/// signature verification and confirm the (height, round, author) triple
/// matches; we do not need to embed an entire block to prove a proposer
/// signed two different ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceMessage {
    /// Height the message was cast at.
    pub height: u64,
    /// Round the message was cast at.
    pub round: u64,
    /// Identity hash of the message (excludes the signature).
    pub id: [u8; 32],
    /// The distinguishing content hash the message attests to (a vote's
    /// blockID, or a proposal's blockID).
    pub block_id: [u8; 32],
    /// Hex-encoded Ed25519 public key of the signer.
    pub pub_key_hex: String,
    /// Hex-encoded Ed25519 signature over `id`.
    pub sig_hex: String,
}

/// Discriminant for the operation a transaction represents.
///
/// Every transaction the engine applies falls into exactly one of these
/// categories, replacing a dynamic `tx.data.type` string discriminator with
/// an exhaustively-matched enum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionPayload {
    /// Simple value transfer between two addresses. Outside the core
    /// consensus rules, but the `balances` map needs *some* way to move
    /// liquid gold, which is what the `applyTransaction` contract exists
    /// to do.
    Transfer { receiver: Address, amount: Amount },
    /// `{type: "STAKE", amountStaked: int>0}`. Bonds `amount` from sender.
    Stake { amount: Amount },
    /// `{type: "UNSTAKE", amountToUnstake: int>0}`. Schedules release at
    /// `h + UNSTAKE_DELAY`.
    Unstake { amount: Amount },
    /// `{type: "EVIDENCE", byzantinePlayer: addr, msg1, msg2}`. Slashes the
    /// named validator once both messages are independently verified.
    Evidence {
        byzantine_player: Address,
        msg1: EvidenceMessage,
        msg2: EvidenceMessage,
    },
}

impl fmt::Display for TransactionPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transfer { .. } => write!(f, "Transfer"),
            Self::Stake { .. } => write!(f, "Stake"),
            Self::Unstake { .. } => write!(f, "Unstake"),
            Self::Evidence { .. } => write!(f, "Evidence"),
        }
    }
}

// ---------------------------------------------------------------------------
// TransactionStatus
// ---------------------------------------------------------------------------

/// Lifecycle state of a transaction within the mempool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionStatus {
    /// Submitted to the mempool, awaiting block inclusion.
    Pending,
    /// Included in a finalized block and applied successfully.
    Confirmed,
    /// Rejected during validation or application.
    Failed,
    /// Exceeded the mempool TTL without being included in a block.
    Expired,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Confirmed => write!(f, "Confirmed"),
            Self::Failed => write!(f, "Failed"),
            Self::Expired => write!(f, "Expired"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_payload_display() {
        let addr = Address([7u8; 32]);
        assert_eq!(
            TransactionPayload::Transfer {
                receiver: addr,
                amount: 1
            }
            .to_string(),
            "Transfer"
        );
        assert_eq!(TransactionPayload::Stake { amount: 1 }.to_string(), "Stake");
        assert_eq!(
            TransactionPayload::Unstake { amount: 1 }.to_string(),
            "Unstake"
        );
    }

    #[test]
    fn transaction_status_display() {
        assert_eq!(TransactionStatus::Pending.to_string(), "Pending");
        assert_eq!(TransactionStatus::Confirmed.to_string(), "Confirmed");
    }

    #[test]
    fn transaction_payload_serde_roundtrip() {
        let addr = Address([9u8; 32]);
        let payloads = vec![
            TransactionPayload::Transfer {
                receiver: addr,
                amount: 500,
            },
            TransactionPayload::Stake { amount: 100 },
            TransactionPayload::Unstake { amount: 50 },
        ];
        for p in payloads {
            let json = serde_json::to_string(&p).unwrap();
            let recovered: TransactionPayload = serde_json::from_str(&json).unwrap();
            assert_eq!(p, recovered);
        }
    }
}
