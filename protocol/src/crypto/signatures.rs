//! # Digital Signatures
//!
//! Ed25519 signing and verification — the backbone of authentication for
//! every vote, proposal, and transaction in the consensus core.
//!
//! ## Why not just use ed25519-dalek directly?
//!
//! We could, and in some internal code we do. But wrapping the operations
//! gives us:
//!
//! 1. A single place to audit all signing operations.
//! 2. Consistent error types across the codebase.
//! 3. Type safety — you can't accidentally pass a hash where a message goes.
//!
//! ## Strictness
//!
//! We use `ed25519-dalek`'s strict verification by default. This means we
//! reject some edge-case signatures that lenient implementations accept.
//! This is deliberate: stricter is safer, and we don't need to be compatible
//! with legacy Ed25519 implementations that get the cofactor wrong.

use thiserror::Error;

use super::keys::{Keypair, PublicKey, Signature};

/// Errors during signature operations.
///
/// Intentionally vague — we don't tell attackers why verification failed.
#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("signature verification failed")]
    VerificationFailed,

    #[error("invalid signature bytes: expected 64 bytes")]
    InvalidSignatureBytes,

    #[error("invalid public key")]
    InvalidPublicKey,
}

/// Sign a message using a validator keypair.
///
/// Produces a 64-byte Ed25519 signature over the given message bytes.
///
/// # Example
///
/// ```
/// use quorum_protocol::crypto::{Keypair, sign, verify};
///
/// let keypair = Keypair::generate();
/// let message = b"precommit for block X";
/// let signature = sign(&keypair, message);
///
/// assert!(verify(&keypair.public_key(), message, &signature));
/// ```
pub fn sign(keypair: &Keypair, message: &[u8]) -> Signature {
    keypair.sign(message)
}

/// Verify an Ed25519 signature against a public key and message.
///
/// Returns `true` if the signature is valid, `false` otherwise. We
/// intentionally don't distinguish between "invalid signature" and "wrong
/// public key" — both are just "nope."
pub fn verify(public_key: &PublicKey, message: &[u8], signature: &Signature) -> bool {
    public_key.verify(message, signature)
}

/// Convenience function for when you need bytes instead of a `Signature`.
pub fn sign_to_bytes(keypair: &Keypair, message: &[u8]) -> Vec<u8> {
    keypair.sign(message).as_bytes().to_vec()
}

/// Verify a signature using raw byte components.
///
/// This is the "I got these bytes off the wire and need to check them"
/// variant. It parses the public key and signature bytes, then verifies.
pub fn verify_raw(public_key_bytes: &[u8], message: &[u8], signature_bytes: &[u8]) -> bool {
    let Ok(pk) = PublicKey::try_from_slice(public_key_bytes) else {
        return false;
    };
    if signature_bytes.len() != 64 {
        return false;
    }
    let mut arr = [0u8; 64];
    arr.copy_from_slice(signature_bytes);
    let sig = Signature::from_bytes(arr);
    pk.verify(message, &sig)
}

/// Batch-verify a set of (public key, message, signature) triples.
///
/// Returns `true` only if every item verifies. Used by the consensus engine
/// when checking a whole VoteBox at once before tallying.
pub fn verify_batch(items: &[(PublicKey, Vec<u8>, Signature)]) -> bool {
    items.iter().all(|(pk, msg, sig)| pk.verify(msg, sig))
}
