//! # Transaction Module
//!
//! Construction, signing, verification, and lifecycle management for
//! consensus-core transactions. Every value transfer, stake, unstake, and
//! piece of equivocation evidence submitted to the network is represented
//! as a [`Transaction`].
//!
//! ## Architecture
//!
//! ```text
//! types.rs        — Core enums and value types (TransactionPayload, Amount)
//! builder.rs      — Fluent TransactionBuilder for constructing unsigned transactions
//! signing.rs      — Transaction signing with Ed25519 keypairs
//! verification.rs — Structural and cryptographic verification of signed transactions
//! ```
//!
//! ## Transaction Lifecycle
//!
//! 1. **Build** — Use [`TransactionBuilder`] to assemble the transaction fields.
//! 2. **Sign** — Call [`sign_transaction`] with the sender's keypair.
//! 3. **Broadcast** — Submit the signed transaction to the mempool.
//! 4. **Verify** — Validators run [`verify_transaction`] before inclusion.
//! 5. **Apply** — The block applies the payload to balances and the stake
//!    ledger, transitioning status from `Pending` to `Confirmed`.
//!
//! ## Design Decisions
//!
//! - Transaction IDs are `double_sha256` of the canonical byte representation
//!   (excluding `sender_public_key` and `signature`), matching Bitcoin's
//!   approach to prevent length-extension attacks on the hash.
//! - All amounts are `u64` in the smallest denomination. No floating point
//!   anywhere near stake or balances.
//! - The operation a transaction performs is a tagged [`TransactionPayload`]
//!   variant rather than a dynamic `{type: string, ...}` blob, so every
//!   application site is exhaustively matched at compile time.

pub mod builder;
pub mod signing;
pub mod types;
pub mod verification;

pub use builder::{Transaction, TransactionBuilder};
pub use signing::sign_transaction;
pub use types::{Amount, EvidenceMessage, TransactionPayload, TransactionStatus};
pub use verification::{verify_transaction, TransactionError};
