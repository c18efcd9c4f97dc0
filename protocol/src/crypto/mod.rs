//! # Cryptographic Primitives
//!
//! This module is the foundation of everything security-related in the
//! consensus core. Every signature, every hash, every address derivation
//! flows through here — it is the concrete realization of the host
//! platform's `hash`/`sign`/`verify`/`addressOf` contract.
//!
//! We deliberately chose boring, well-audited cryptography:
//!
//! - **Ed25519** for signatures — fast, deterministic, and nobody has broken it.
//! - **BLAKE3** for hashing — because we live in the future.
//! - **SHA-256** for compatibility with transaction-id conventions elsewhere.
//!
//! ## A note on "rolling your own crypto"
//!
//! We don't. Everything here is a thin, type-safe wrapper around audited
//! implementations.

pub mod hash;
pub mod keys;
pub mod signatures;

// Re-export the things people actually need so they don't have to memorize
// our module hierarchy.
pub use hash::{blake3_hash, double_sha256, sha256};
pub use keys::{address_of, Address, Keypair, PublicKey, Signature};
pub use signatures::{sign, verify};
