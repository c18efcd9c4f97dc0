//! # Network Module
//!
//! The ambient networking layer the consensus engine runs on top of: an
//! in-process, best-effort broadcast fabric and a fee-priority transaction
//! pool. Real P2P transport, gossip deduplication, and peer discovery
//! remain external collaborators (see the project's Non-goals).
//!
//! ## Architecture
//!
//! ```text
//! broadcast.rs — Network.broadcast(channel, payload) contract, in-process fabric
//! mempool.rs   — Fee-priority TxPool
//! ```
//!
//! ## Design Decisions
//!
//! - The pool is protected by `parking_lot::RwLock` rather than
//!   `tokio::Mutex` because reads (block production) vastly outnumber
//!   writes, and we want zero-cost reads on the hot path.
//! - Broadcast delivery is at-most-once with no ordering guarantee: a full
//!   receiver channel drops the message rather than applying backpressure
//!   to the sender, matching the protocol's tolerance for loss/reorder.

pub mod broadcast;
pub mod mempool;

pub use broadcast::{Broadcaster, ChannelNetwork, NetworkMessage};
pub use mempool::{TxPool, TxPoolError};
