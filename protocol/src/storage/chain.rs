//! In-memory chain of committed blocks.
//!
//! No durable persistence — a restart starts from genesis again. Real
//! persistence remains an external collaborator, as it does for the block
//! structure itself.

use super::block::Block;

/// Ordered chain of committed blocks, indexed by height.
#[derive(Debug, Clone, Default)]
pub struct Chain {
    blocks: Vec<Block>,
}

impl Chain {
    /// Starts a chain from a genesis block.
    pub fn new(genesis: Block) -> Self {
        Self { blocks: vec![genesis] }
    }

    /// Appends a newly-finalized block to the chain tip.
    ///
    /// Does not itself validate `block.rerun(parent)` — callers finalize
    /// only blocks that already passed the consensus engine's commit
    /// tallying, so re-validation here would be redundant.
    pub fn append(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// The most recently committed block.
    pub fn tip(&self) -> Option<&Block> {
        self.blocks.last()
    }

    /// Number of committed blocks, including genesis.
    pub fn height(&self) -> u64 {
        self.blocks.len() as u64
    }

    /// Look up a block by height.
    pub fn at(&self, height: u64) -> Option<&Block> {
        self.blocks.get(height as usize)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }
}
