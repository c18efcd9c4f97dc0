//! Transaction signing with Ed25519 keypairs.
//!
//! Signing is a separate step from building because the keypair may not
//! be available at construction time (e.g., hardware wallet, remote signer).
//! The signing data is the canonical [`Transaction::signable_bytes`] output,
//! which deterministically excludes the `id`, `sender_public_key`, and
//! `signature` fields.

use super::builder::Transaction;
use crate::crypto::keys::Keypair;

/// Signs a transaction in place using the provided keypair.
///
/// The signing procedure:
/// 1. Compute `signable_bytes()` — the canonical binary serialization of all
///    fields except `id`, `sender_public_key`, and `signature`.
/// 2. Produce an Ed25519 signature over those bytes.
/// 3. Store the hex-encoded signature and sender public key on the
///    transaction.
///
/// The transaction `id` is not affected by signing; it is derived from the
/// same signable bytes and is already fixed at build time.
///
/// # Arguments
///
/// * `tx` — A mutable reference to the transaction to sign. The
///   `signature` and `sender_public_key` fields will be overwritten.
/// * `keypair` — The sender's Ed25519 keypair. The caller is responsible
///   for ensuring this matches `tx.sender`.
///
/// # Example
///
/// ```rust,no_run
/// use quorum_protocol::crypto::Keypair;
/// use quorum_protocol::transaction::{sign_transaction, TransactionBuilder};
///
/// let keypair = Keypair::generate();
/// let mut tx = TransactionBuilder::stake(keypair.address(), 1_000)
///     .nonce(1)
///     .build();
///
/// sign_transaction(&mut tx, &keypair);
/// assert!(tx.is_signed());
/// ```
pub fn sign_transaction<'a>(tx: &'a mut Transaction, keypair: &Keypair) -> &'a Transaction {
    let signable = tx.signable_bytes();
    let signature = keypair.sign(&signable);
    tx.signature = Some(signature.to_hex());
    tx.sender_public_key = Some(keypair.public_key().to_hex());
    tx
}
