//! Client-facing staking operations.
//!
//! The original staking client mixed staking behavior into every node via a
//! JS mixin applied to a base class. Rust has no mixins; the equivalent
//! seam is a capability trait any type holding an address, a nonce, and a
//! view of chain state can implement.

use crate::crypto::{Address, Keypair};
use crate::storage::Block;
use crate::transaction::{sign_transaction, Amount, Transaction, TransactionBuilder};

/// Capability for an entity that can query its own stake position and
/// submit staking/unstaking transactions.
pub trait StakeholderCapability {
    /// Liquid balance available to spend or bond.
    fn available_gold(&self) -> u64;

    /// Currently bonded stake (including stake pending release).
    fn amount_gold_staked(&self) -> u64;

    /// Builds and signs a Stake transaction for `amount`.
    fn post_staking_transaction(&mut self, amount: Amount, keypair: &Keypair) -> Transaction;

    /// Builds and signs an Unstake transaction for `amount`.
    fn post_unstaking_transaction(&mut self, amount: Amount, keypair: &Keypair) -> Transaction;
}

/// A client's view of its own position, refreshed from whatever block it
/// last observed, plus the nonce counter needed to build successive
/// transactions.
pub struct StakingClient {
    pub address: Address,
    pub nonce: u64,
    available_gold: u64,
    staked: u64,
}

impl StakingClient {
    pub fn new(address: Address, starting_nonce: u64) -> Self {
        Self {
            address,
            nonce: starting_nonce,
            available_gold: 0,
            staked: 0,
        }
    }

    /// Refreshes the cached balance/stake snapshot from `block`.
    pub fn refresh(&mut self, block: &Block) {
        self.available_gold = block.balances.get(&self.address).copied().unwrap_or(0);
        self.staked = block
            .stake_ledger
            .stake_balances
            .get(&self.address)
            .copied()
            .unwrap_or(0);
    }

    fn next_nonce(&mut self) -> u64 {
        self.nonce += 1;
        self.nonce
    }
}

impl StakeholderCapability for StakingClient {
    fn available_gold(&self) -> u64 {
        self.available_gold
    }

    fn amount_gold_staked(&self) -> u64 {
        self.staked
    }

    fn post_staking_transaction(&mut self, amount: Amount, keypair: &Keypair) -> Transaction {
        let nonce = self.next_nonce();
        let mut tx = TransactionBuilder::stake(self.address, amount)
            .nonce(nonce)
            .build();
        sign_transaction(&mut tx, keypair);
        tx
    }

    fn post_unstaking_transaction(&mut self, amount: Amount, keypair: &Keypair) -> Transaction {
        let nonce = self.next_nonce();
        let mut tx = TransactionBuilder::unstake(self.address, amount)
            .nonce(nonce)
            .build();
        sign_transaction(&mut tx, keypair);
        tx
    }
}
