//! Fee-priority transaction pool.
//!
//! Concrete realization of the host platform's `TxPool` external contract:
//! accepts and forwards pending transactions. Thread-safe so a validator's
//! consensus task and its inbound-message handler can share one pool.

use std::collections::HashMap;

use parking_lot::RwLock;
use thiserror::Error;

use crate::transaction::Transaction;

#[derive(Debug, Error)]
pub enum TxPoolError {
    #[error("mempool is full (capacity {capacity})")]
    Full { capacity: usize },

    #[error("transaction {id} already pending")]
    Duplicate { id: String },
}

/// A thread-safe, fee-priority transaction pool.
///
/// Transactions are keyed by ID. [`TxPool::drain_for_proposal`] returns
/// pending transactions ordered by descending fee, which is what a proposer
/// building a new block wants: the highest-paying transactions included
/// first, up to the requested cap.
#[derive(Debug)]
pub struct TxPool {
    txs: RwLock<HashMap<String, Transaction>>,
    max_size: usize,
}

impl TxPool {
    /// Creates a new pool with the given maximum pending-transaction count.
    pub fn new(max_size: usize) -> Self {
        Self {
            txs: RwLock::new(HashMap::new()),
            max_size,
        }
    }

    /// Accepts a transaction into the pool.
    ///
    /// Callers are expected to have already run [`crate::transaction::verify_transaction`]
    /// — this pool performs no signature or structural validation of its own.
    pub fn insert(&self, tx: Transaction) -> Result<(), TxPoolError> {
        let mut txs = self.txs.write();
        if txs.contains_key(&tx.id) {
            return Err(TxPoolError::Duplicate { id: tx.id });
        }
        if txs.len() >= self.max_size {
            return Err(TxPoolError::Full {
                capacity: self.max_size,
            });
        }
        txs.insert(tx.id.clone(), tx);
        Ok(())
    }

    /// Removes a transaction by ID, e.g. once it has been confirmed on
    /// chain.
    pub fn remove(&self, id: &str) {
        self.txs.write().remove(id);
    }

    /// Removes every transaction in `ids` — used after a block commits to
    /// drop its included transactions from the pool in one pass.
    pub fn remove_all(&self, ids: &[String]) {
        let mut txs = self.txs.write();
        for id in ids {
            txs.remove(id);
        }
    }

    /// Returns up to `limit` pending transactions, highest fee first, for a
    /// proposer assembling a new block. Does not remove them from the pool —
    /// callers remove via [`TxPool::remove_all`] once the block commits.
    pub fn drain_for_proposal(&self, limit: usize) -> Vec<Transaction> {
        let txs = self.txs.read();
        let mut candidates: Vec<Transaction> = txs.values().cloned().collect();
        candidates.sort_by(|a, b| b.fee.cmp(&a.fee).then_with(|| a.id.cmp(&b.id)));
        candidates.truncate(limit);
        candidates
    }

    pub fn len(&self) -> usize {
        self.txs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.txs.read().is_empty()
    }
}

impl Default for TxPool {
    fn default() -> Self {
        Self::new(10_000)
    }
}
