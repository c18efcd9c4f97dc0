//! Transaction verification: structural checks and cryptographic validation.
//!
//! Every transaction entering the mempool or proposed in a block must pass
//! [`verify_transaction`]. The checks are ordered from cheapest to most
//! expensive (integer comparisons before signature verification) to fail
//! fast and waste minimal CPU on invalid transactions.

use chrono::Utc;
use thiserror::Error;

use super::builder::Transaction;
use super::types::TransactionPayload;
use crate::crypto::keys::address_of;

/// Maximum allowed clock skew for transaction timestamps, in seconds.
/// Transactions with timestamps more than this many seconds in the future
/// are rejected. 5 minutes matches the mempool TTL.
const MAX_FUTURE_SECONDS: i64 = 300;

/// Errors that can occur during transaction verification.
///
/// Each variant maps to a specific validation rule. The error message
/// includes enough context for debugging without leaking internal state.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// The transaction ID does not match the double-SHA-256 of its signable bytes.
    #[error("transaction ID mismatch: expected {expected}, got {actual}")]
    IdMismatch { expected: String, actual: String },

    /// The transaction is not signed (signature field is `None`).
    #[error("transaction is unsigned")]
    MissingSignature,

    /// The signature is malformed (cannot be decoded from hex or wrong length).
    #[error("malformed signature: {reason}")]
    MalformedSignature { reason: String },

    /// The Ed25519 signature does not verify against the sender's public key.
    #[error("invalid signature: does not verify against sender {sender}")]
    InvalidSignature { sender: String },

    /// No public key is embedded, or it does not hash to the claimed sender.
    #[error("invalid sender public key for address {address}")]
    InvalidSenderKey { address: String },

    /// The nonce is zero, which is reserved. Valid nonces start at 1.
    #[error("invalid nonce: must be > 0, got {nonce}")]
    InvalidNonce { nonce: u64 },

    /// A transfer, stake, or unstake amount is zero.
    #[error("amount must be > 0")]
    ZeroAmount,

    /// The sender and receiver of a transfer are the same address.
    #[error("sender and receiver must differ: both are {address}")]
    SelfTransfer { address: String },

    /// The transaction timestamp is too far in the future.
    #[error("timestamp {timestamp_ms} is {delta_secs}s in the future (max allowed: {max_secs}s)")]
    TimestampTooFarInFuture {
        timestamp_ms: u64,
        delta_secs: i64,
        max_secs: i64,
    },

    /// An evidence transaction names the reporter as the byzantine player.
    #[error("evidence cannot name the reporter as the byzantine player")]
    SelfAccusingEvidence,
}

/// Verifies a signed transaction for structural correctness and cryptographic
/// validity.
///
/// The checks, in order:
///
/// 1. **Nonce** — must be > 0.
/// 2. **Payload-specific structural checks** — non-zero amounts, no
///    self-transfers, no self-accusing evidence.
/// 3. **Timestamp** — must not be more than 5 minutes in the future.
/// 4. **Transaction ID** — must equal `double_sha256(signable_bytes)`.
/// 5. **Signature present** — the transaction must be signed.
/// 6. **Sender key valid** — the embedded public key must hash to `sender`.
/// 7. **Signature valid** — Ed25519 verification against the sender's
///    public key.
///
/// # Errors
///
/// Returns the first failing check as a [`TransactionError`].
pub fn verify_transaction(tx: &Transaction) -> Result<(), TransactionError> {
    // 1. Nonce must be positive (0 is reserved for genesis/system txs).
    if tx.nonce == 0 {
        return Err(TransactionError::InvalidNonce { nonce: tx.nonce });
    }

    // 2. Payload-specific structural checks.
    match &tx.payload {
        TransactionPayload::Transfer { receiver, amount } => {
            if *amount == 0 {
                return Err(TransactionError::ZeroAmount);
            }
            if *receiver == tx.sender {
                return Err(TransactionError::SelfTransfer {
                    address: tx.sender.to_hex(),
                });
            }
        }
        TransactionPayload::Stake { amount } | TransactionPayload::Unstake { amount } => {
            if *amount == 0 {
                return Err(TransactionError::ZeroAmount);
            }
        }
        TransactionPayload::Evidence {
            byzantine_player, ..
        } => {
            if *byzantine_player == tx.sender {
                return Err(TransactionError::SelfAccusingEvidence);
            }
        }
    }

    // 3. Timestamp must not be unreasonably far in the future.
    let now_ms = Utc::now().timestamp_millis() as u64;
    let max_future_ms = now_ms + (MAX_FUTURE_SECONDS as u64 * 1_000);
    if tx.timestamp > max_future_ms {
        let delta_secs = (tx.timestamp as i64 - now_ms as i64) / 1_000;
        return Err(TransactionError::TimestampTooFarInFuture {
            timestamp_ms: tx.timestamp,
            delta_secs,
            max_secs: MAX_FUTURE_SECONDS,
        });
    }

    // 4. Transaction ID integrity check.
    let expected_id = tx.compute_id();
    if tx.id != expected_id {
        return Err(TransactionError::IdMismatch {
            expected: expected_id,
            actual: tx.id.clone(),
        });
    }

    // 5. Signature must be present.
    let signature = tx
        .parsed_signature()
        .ok_or(TransactionError::MissingSignature)?;

    // 6. The embedded public key must hash to the claimed sender address.
    let sender_pk = tx
        .sender_public_key()
        .ok_or_else(|| TransactionError::InvalidSenderKey {
            address: tx.sender.to_hex(),
        })?;
    if address_of(&sender_pk) != tx.sender {
        return Err(TransactionError::InvalidSenderKey {
            address: tx.sender.to_hex(),
        });
    }

    // 7. Verify the signature against the sender's public key.
    let signable = tx.signable_bytes();
    if !sender_pk.verify(&signable, &signature) {
        return Err(TransactionError::InvalidSignature {
            sender: tx.sender.to_hex(),
        });
    }

    Ok(())
}
