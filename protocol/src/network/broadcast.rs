//! In-process broadcast fabric.
//!
//! Concrete realization of the host platform's `Network.broadcast(channel,
//! payload)` contract. Real P2P transport remains out of scope; this is a
//! best-effort, at-most-once, unordered fan-out over `tokio::sync::mpsc`
//! channels. No ordering or delivery guarantee is made or needed — the
//! consensus round timers and vote tallying already tolerate loss.

use std::collections::HashMap;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::trace;

/// Well-known channel identifiers. Must stay bit-stable across peers.
pub const CHANNEL_POST_TRANSACTION: &str = "POST_TRANSACTION";
pub const CHANNEL_BLOCK_PROPOSAL: &str = "BLOCK_PROPOSAL";
pub const CHANNEL_PREVOTE: &str = "PREVOTE";
pub const CHANNEL_PRECOMMIT: &str = "PRECOMMIT";
pub const CHANNEL_COMMIT: &str = "COMMIT";
pub const CHANNEL_NEW_ROUND: &str = "NEW_ROUND";

/// A message fanned out over the network fabric: which validator sent it,
/// on which channel, with what payload bytes. The consensus engine encodes
/// votes/proposals/transactions to bytes before broadcasting and decodes
/// them on receipt — the fabric itself is payload-agnostic.
#[derive(Debug, Clone)]
pub struct NetworkMessage {
    pub channel: &'static str,
    pub from: String,
    pub payload: Vec<u8>,
}

/// Broadcast contract: fire-and-forget delivery to every other subscriber.
pub trait Broadcaster: Send + Sync {
    fn broadcast(&self, from: &str, channel: &'static str, payload: Vec<u8>);
}

/// An in-process channel fabric connecting every validator running in the
/// same devnet process. Each validator registers an mpsc sender keyed by its
/// own identity; `broadcast` fans a message out to every *other* registered
/// receiver. Delivery is best-effort: a full receiver queue silently drops
/// the message rather than blocking the sender, matching the "no ordering,
/// tolerates loss" contract.
#[derive(Default)]
pub struct ChannelNetwork {
    peers: RwLock<HashMap<String, mpsc::Sender<NetworkMessage>>>,
}

impl ChannelNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a validator and returns the receiving half of its inbound
    /// message channel.
    pub fn register(&self, id: &str, buffer: usize) -> mpsc::Receiver<NetworkMessage> {
        let (tx, rx) = mpsc::channel(buffer);
        self.peers.write().insert(id.to_string(), tx);
        rx
    }

    pub fn unregister(&self, id: &str) {
        self.peers.write().remove(id);
    }
}

impl Broadcaster for ChannelNetwork {
    fn broadcast(&self, from: &str, channel: &'static str, payload: Vec<u8>) {
        let peers = self.peers.read();
        for (id, sender) in peers.iter() {
            if id == from {
                continue;
            }
            let msg = NetworkMessage {
                channel,
                from: from.to_string(),
                payload: payload.clone(),
            };
            if sender.try_send(msg).is_err() {
                trace!(channel, to = id, "dropped message: receiver full or closed");
            }
        }
    }
}
