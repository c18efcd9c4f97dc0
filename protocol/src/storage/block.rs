//! # Block Structure
//!
//! A block is the atomic unit of consensus. Each block contains an ordered
//! list of transactions, a link to the previous block (forming the chain),
//! the liquid `balances` ledger, and the embedded [`StakeLedger`] that the
//! consensus engine consults for voting power.
//!
//! ## Hash Computation
//!
//! The block hash (its `BlockID`) covers every consensus-relevant field:
//! `height || parent_hash || timestamp || validator || tx_root || balances
//! || stake_ledger`. The signature is NOT included in the hash (it signs
//! the hash, not the other way around).
//!
//! ## Merkle Root
//!
//! `tx_root` is a binary Merkle tree over the BLAKE3 hashes of each
//! transaction's canonical serialization. Empty blocks have a tx_root of
//! all zeros.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::consensus::stake_ledger::StakeLedger;
use crate::crypto::hash::blake3_hash;
use crate::crypto::Address;
use crate::transaction::{Transaction, TransactionPayload};

/// Distinguished sentinel BlockID meaning "no block this round." No real
/// block hash can collide with it: `compute_header_hash` always mixes in a
/// non-empty validator address and a Merkle root, so the all-zero digest
/// never occurs for genuine content.
pub const NIL_BLOCK_ID: [u8; 32] = [0u8; 32];

// ---------------------------------------------------------------------------
// BlockHeader
// ---------------------------------------------------------------------------

/// Lightweight block header — everything except the transaction list and
/// ledgers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Block height (0-indexed, genesis = 0).
    pub height: u64,
    /// Content hash of this block (its `BlockID`).
    pub hash: [u8; 32],
    /// Hash of the parent block. All zeros for genesis.
    pub parent_hash: [u8; 32],
    /// Unix timestamp (milliseconds) when this block was produced.
    pub timestamp: u64,
    /// Address of the validator that proposed this block.
    pub validator: Address,
    /// Merkle root of the transactions in this block.
    pub tx_root: [u8; 32],
    /// Ed25519 signature of the validator over the block hash, hex-encoded.
    pub signature: Option<String>,
}

impl BlockHeader {
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }

    pub fn parent_hash_hex(&self) -> String {
        hex::encode(self.parent_hash)
    }
}

// ---------------------------------------------------------------------------
// Block
// ---------------------------------------------------------------------------

/// A full block: header, ordered transaction list, liquid balances, and the
/// embedded [`StakeLedger`] this block's consensus round votes against.
///
/// `balances` and the ledger's internal maps use `BTreeMap` rather than
/// `HashMap` so that `id()` (the content hash) is reproducible across
/// processes without needing to sort at hash time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
    /// Liquid ("gold") balances, distinct from bonded stake.
    pub balances: BTreeMap<Address, u64>,
    /// The staking ledger this block's round votes against.
    pub stake_ledger: StakeLedger,
}

impl Block {
    /// Constructs the genesis block from a starting balance/stake
    /// distribution. Every address in `starting_stake` receives that amount
    /// in both `stake_ledger.stake_balances` and `stake_ledger.accum_power`,
    /// per the genesis configuration contract.
    pub fn genesis(starting_stake: BTreeMap<Address, u64>) -> Self {
        let stake_ledger = StakeLedger::genesis(starting_stake);
        let balances = BTreeMap::new();
        let validator = Address([0u8; 32]);
        let timestamp = 0u64;
        let tx_root = NIL_BLOCK_ID;

        let hash =
            compute_header_hash(0, &[0u8; 32], timestamp, &validator, &tx_root, &balances, &stake_ledger);

        Block {
            header: BlockHeader {
                height: 0,
                hash,
                parent_hash: [0u8; 32],
                timestamp,
                validator,
                tx_root,
                signature: None,
            },
            transactions: Vec::new(),
            balances,
            stake_ledger,
        }
    }

    /// Constructs a child block extending `parent`. The child's stake
    /// ledger starts as `parent.stake_ledger.child_for_height(height)`
    /// (deep-cloned and advanced past any maturing unstaking events);
    /// callers then apply transactions via [`Block::apply_transaction`]
    /// before signing. `validator` is charged the round's accumulated-power
    /// update, so the persisted ledger reflects only the round that
    /// actually produced this block — a round that failed and never became
    /// a block leaves no trace in `accum_power`.
    pub fn new(parent: &Block, transactions: Vec<Transaction>, validator: Address, timestamp: u64) -> Self {
        let height = parent.header.height + 1;
        let parent_hash = parent.header.hash;
        let mut balances = parent.balances.clone();
        let mut stake_ledger = parent.stake_ledger.child_for_height(height);

        for tx in &transactions {
            apply_payload(&mut balances, &mut stake_ledger, tx);
        }
        stake_ledger.update_accum_power(validator);

        let tx_root = compute_merkle_root(&transactions);
        let hash = compute_header_hash(height, &parent_hash, timestamp, &validator, &tx_root, &balances, &stake_ledger);

        Block {
            header: BlockHeader {
                height,
                hash,
                parent_hash,
                timestamp,
                validator,
                tx_root,
                signature: None,
            },
            transactions,
            balances,
            stake_ledger,
        }
    }

    /// Applies a single transaction's payload to this block's balances and
    /// stake ledger, then recomputes the header hash to match. Used when
    /// transactions are appended incrementally (e.g. evidence discovered
    /// mid-round) rather than supplied up front to [`Block::new`].
    pub fn apply_transaction(&mut self, tx: Transaction) {
        apply_payload(&mut self.balances, &mut self.stake_ledger, &tx);
        self.transactions.push(tx);
        self.header.tx_root = compute_merkle_root(&self.transactions);
        self.header.hash = self.compute_hash();
    }

    /// Re-derives this block deterministically from `parent` and compares
    /// the result to `self`. Used to confirm a received proposal is a valid
    /// extension of a known parent — the host-platform `rerun(parent)`
    /// contract.
    pub fn rerun(&self, parent: &Block) -> bool {
        let mut replay = Block::new(parent, self.transactions.clone(), self.header.validator, self.header.timestamp);
        replay.header.signature = self.header.signature.clone();
        replay == *self
    }

    /// Recompute the block hash from its constituent fields.
    pub fn compute_hash(&self) -> [u8; 32] {
        compute_header_hash(
            self.header.height,
            &self.header.parent_hash,
            self.header.timestamp,
            &self.header.validator,
            &self.header.tx_root,
            &self.balances,
            &self.stake_ledger,
        )
    }

    /// The block's `BlockID` — its content hash.
    pub fn id(&self) -> [u8; 32] {
        self.header.hash
    }

    /// Verifies internal consistency: the stored hash matches the
    /// recomputed hash, the stored tx_root matches the recomputed Merkle
    /// root, and genesis-specific invariants hold.
    pub fn verify(&self) -> Result<(), String> {
        let expected_hash = self.compute_hash();
        if self.header.hash != expected_hash {
            return Err(format!(
                "block {} hash mismatch: stored={}, computed={}",
                self.header.height,
                hex::encode(self.header.hash),
                hex::encode(expected_hash),
            ));
        }

        let expected_tx_root = compute_merkle_root(&self.transactions);
        if self.header.tx_root != expected_tx_root {
            return Err(format!(
                "block {} tx_root mismatch: stored={}, computed={}",
                self.header.height,
                hex::encode(self.header.tx_root),
                hex::encode(expected_tx_root),
            ));
        }

        if self.header.height == 0 && self.header.parent_hash != [0u8; 32] {
            return Err("genesis block must have zeroed parent_hash".to_string());
        }

        Ok(())
    }

    pub fn height(&self) -> u64 {
        self.header.height
    }

    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }

    pub fn hash_hex(&self) -> String {
        hex::encode(self.header.hash)
    }
}

/// Applies a single transaction's effect to `balances`/`stake_ledger`.
/// Unrecognized payload variants cannot occur — `TransactionPayload` is an
/// exhaustively-matched enum, so there is no `UnknownTxType` branch to
/// handle here.
fn apply_payload(balances: &mut BTreeMap<Address, u64>, ledger: &mut StakeLedger, tx: &Transaction) {
    match &tx.payload {
        TransactionPayload::Transfer { receiver, amount } => {
            let sender_balance = balances.entry(tx.sender).or_insert(0);
            *sender_balance = sender_balance.saturating_sub(*amount);
            *balances.entry(*receiver).or_insert(0) += amount;
        }
        TransactionPayload::Stake { amount } => {
            ledger.stake(tx.sender, *amount);
        }
        TransactionPayload::Unstake { amount } => {
            ledger.unstake(tx.sender, *amount);
        }
        TransactionPayload::Evidence {
            byzantine_player,
            msg1,
            msg2,
        } => {
            // Two honest validators can independently detect and submit
            // the same equivocation; record_slashed_pair dedupes by the
            // unordered (id1, id2) pair so only the first application
            // actually seizes stake.
            if ledger.record_slashed_pair(msg1.id, msg2.id) && ledger.slash(*byzantine_player) {
                let entry = balances.entry(*byzantine_player).or_insert(0);
                *entry = 0;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Hash computation
// ---------------------------------------------------------------------------

fn compute_header_hash(
    height: u64,
    parent_hash: &[u8; 32],
    timestamp: u64,
    validator: &Address,
    tx_root: &[u8; 32],
    balances: &BTreeMap<Address, u64>,
    stake_ledger: &StakeLedger,
) -> [u8; 32] {
    let mut preimage = Vec::with_capacity(256);
    preimage.extend_from_slice(&height.to_le_bytes());
    preimage.extend_from_slice(parent_hash);
    preimage.extend_from_slice(&timestamp.to_le_bytes());
    preimage.extend_from_slice(validator.as_bytes());
    preimage.extend_from_slice(tx_root);
    for (addr, bal) in balances {
        preimage.extend_from_slice(addr.as_bytes());
        preimage.extend_from_slice(&bal.to_le_bytes());
    }
    preimage.extend_from_slice(&bincode::serialize(stake_ledger).unwrap_or_default());
    blake3_hash(&preimage)
}

/// Computes a binary Merkle tree root over a list of transactions.
///
/// Each leaf is the BLAKE3 hash of the transaction's canonical JSON
/// serialization. An empty list produces a root of all zeros.
pub fn compute_merkle_root(transactions: &[Transaction]) -> [u8; 32] {
    if transactions.is_empty() {
        return [0u8; 32];
    }

    let mut hashes: Vec<[u8; 32]> = transactions
        .iter()
        .map(|tx| {
            let serialized = serde_json::to_vec(tx).unwrap_or_default();
            blake3_hash(&serialized)
        })
        .collect();

    while hashes.len() > 1 {
        let mut next_level = Vec::with_capacity((hashes.len() + 1) / 2);
        for chunk in hashes.chunks(2) {
            let mut combined = Vec::with_capacity(64);
            combined.extend_from_slice(&chunk[0]);
            combined.extend_from_slice(chunk.get(1).unwrap_or(&chunk[0]));
            next_level.push(blake3_hash(&combined));
        }
        hashes = next_level;
    }

    hashes[0]
}
