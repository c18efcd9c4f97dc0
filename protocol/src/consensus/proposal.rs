//! Signed block proposals.

use serde::{Deserialize, Serialize};

use crate::crypto::hash::blake3_hash;
use crate::crypto::{Address, Keypair, PublicKey, Signature};
use crate::storage::Block;

/// A signed proposal for a block at a specific `(height, round)`.
///
/// Identity is the BLAKE3 hash of every field except `sig`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    pub from: Address,
    pub block_id: [u8; 32],
    pub block: Block,
    pub height: u64,
    pub round: u64,
    pub pub_key: PublicKey,
    pub sig: Option<Signature>,
}

impl Proposal {
    pub fn new(from: Address, block: Block, round: u64, pub_key: PublicKey) -> Self {
        let block_id = block.id();
        let height = block.height();
        Self {
            from,
            block_id,
            block,
            height,
            round,
            pub_key,
            sig: None,
        }
    }

    fn signable_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(96);
        buf.extend_from_slice(self.from.as_bytes());
        buf.extend_from_slice(&self.block_id);
        buf.extend_from_slice(&self.height.to_le_bytes());
        buf.extend_from_slice(&self.round.to_le_bytes());
        buf.extend_from_slice(self.pub_key.as_bytes());
        buf
    }

    pub fn id(&self) -> [u8; 32] {
        blake3_hash(&self.signable_bytes())
    }

    pub fn sign(&mut self, keypair: &Keypair) {
        let bytes = self.signable_bytes();
        self.sig = Some(keypair.sign(&bytes));
    }

    /// Validity: the signature verifies, `from` matches `pub_key`, the
    /// embedded block's height matches the proposal's height, and the
    /// proposal's `block_id` equals the block's actual content hash.
    pub fn is_valid(&self) -> bool {
        let Some(sig) = &self.sig else {
            return false;
        };
        if crate::crypto::address_of(&self.pub_key) != self.from {
            return false;
        }
        if !self.pub_key.verify(&self.signable_bytes(), sig) {
            return false;
        }
        if self.block.height() != self.height {
            return false;
        }
        self.block.id() == self.block_id
    }
}
