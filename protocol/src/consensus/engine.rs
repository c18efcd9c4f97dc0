//! The per-height round state machine.
//!
//! Replaces a `setTimeout`-callback chain with an explicit [`RoundPhase`]
//! enum driven by `tokio::select!` over an inbound message channel and a
//! phase timer. Each round's timer lasts `round * DELTA` (linear backoff) —
//! later rounds give a slow or recovering network more time before giving
//! up and moving on.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

use crate::config::{
    CHANNEL_BLOCK_PROPOSAL, CHANNEL_COMMIT, CHANNEL_PRECOMMIT, CHANNEL_PREVOTE, COMMIT_TIME, DELTA,
    FINALIZE_MAX_RETRIES,
};
use crate::consensus::proposal::Proposal;
use crate::consensus::proposer::ProposerSelector;
use crate::consensus::stake_ledger::StakeLedger;
use crate::consensus::tally::{count_votes, TallyResult};
use crate::consensus::vote::{Phase as VotePhase, Vote};
use crate::consensus::vote_box::{RecordOutcome, VoteBox};
use crate::crypto::{Address, Keypair};
use crate::network::{Broadcaster, NetworkMessage, TxPool};
use crate::storage::block::NIL_BLOCK_ID;
use crate::storage::{Block, Chain};

/// Stages of a single round, in order. A round that fails to commit returns
/// to `Propose` at `round + 1` with a longer timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    Propose,
    Prevote,
    Precommit,
    CommitDecision,
    Commit,
    Finalize,
}

/// A validator's proof-of-lock: the highest round in which it prevoted for
/// a non-NIL block, and which block that was. Once locked, the validator
/// must keep prevoting for the locked block in later rounds of the same
/// height unless it observes a newer proof-of-lock for a different block.
#[derive(Debug, Clone)]
struct LockedValue {
    round: u64,
    block: Block,
}

/// Drives one validator's participation in the consensus protocol: height
/// by height, round by round, phase by phase.
pub struct ConsensusEngine<B: Broadcaster> {
    pub address: Address,
    keypair: Keypair,
    chain: Chain,
    mempool: TxPool,
    network: Arc<B>,
    inbox: mpsc::Receiver<NetworkMessage>,
    vote_box: VoteBox,
    locked: Option<LockedValue>,
}

impl<B: Broadcaster> ConsensusEngine<B> {
    pub fn new(
        keypair: Keypair,
        chain: Chain,
        mempool: TxPool,
        network: Arc<B>,
        inbox: mpsc::Receiver<NetworkMessage>,
    ) -> Self {
        let address = keypair.address();
        Self {
            address,
            keypair,
            chain,
            mempool,
            network,
            inbox,
            vote_box: VoteBox::new(),
            locked: None,
        }
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn mempool_mut(&mut self) -> &mut TxPool {
        &mut self.mempool
    }

    /// Runs rounds at the current height until one commits, returning the
    /// committed block. The engine's internal `locked` state resets once a
    /// height finalizes.
    pub async fn run_height(&mut self) -> Block {
        let parent = self.chain.tip().cloned().expect("chain must have a genesis block");
        let height = parent.height() + 1;
        let mut ledger = parent.stake_ledger.child_for_height(height);
        self.locked = None;

        let mut round = 0u64;
        loop {
            if let Some(block) = self.run_round(&parent, &mut ledger, height, round).await {
                self.chain.append(block.clone());
                return block;
            }
            round += 1;
        }
    }

    /// Runs a single round. Returns `Some(block)` if this round committed,
    /// `None` if it should advance to `round + 1`.
    async fn run_round(&mut self, parent: &Block, ledger: &mut StakeLedger, height: u64, round: u64) -> Option<Block> {
        let timer = DELTA * (round as u32 + 1);
        // Advances accum_power even on a round that ultimately fails, so a
        // round that times out because its proposer is offline rotates to a
        // different proposer next round rather than reselecting the same one.
        let proposer = ProposerSelector::select_and_advance(ledger)?;
        debug!(height, round, proposer = %proposer.to_hex(), "starting round");

        // --- Propose ---------------------------------------------------
        let proposed_block = if proposer == self.address {
            let block = self.build_proposal_block(parent);
            let mut proposal = Proposal::new(self.address, block.clone(), round, self.keypair.public_key());
            proposal.sign(&self.keypair);
            self.broadcast(CHANNEL_BLOCK_PROPOSAL, &proposal);
            Some(block)
        } else {
            self.await_proposal(parent, proposer, height, round, timer).await
        };

        // --- Prevote -----------------------------------------------------
        let prevote_target = self.decide_prevote_target(&proposed_block);
        self.cast_vote(VotePhase::Prevote, height, round, prevote_target);
        self.collect_phase(height, round, VotePhase::Prevote, timer).await;

        // Carried-over commits from an earlier round of this height count
        // toward both prevote and precommit quorum in the current round —
        // a validator that already committed doesn't need to re-send ballots.
        // One ballot per voter: a current-round ballot takes precedence
        // over a carried commit from the same validator.
        let carried_commits = self.vote_box.commit_votes_for_height(height);
        let prevote_ballots = merge_one_per_voter(
            &self.vote_box.votes_for(height, round, VotePhase::Prevote),
            &carried_commits,
        );
        let prevote_tally = count_votes(&prevote_ballots, ledger);

        // --- Precommit ---------------------------------------------------
        let precommit_target = match prevote_tally {
            TallyResult::Quorum { block_id } if block_id != NIL_BLOCK_ID => {
                if let Some(block) = proposed_block.clone().filter(|b| b.id() == block_id) {
                    self.locked = Some(LockedValue { round, block });
                }
                block_id
            }
            TallyResult::Quorum { block_id } => {
                // NIL reached prevote quorum: release any held lock.
                self.locked = None;
                block_id
            }
            TallyResult::NoQuorum => NIL_BLOCK_ID,
        };
        self.cast_vote(VotePhase::Precommit, height, round, precommit_target);
        self.collect_phase(height, round, VotePhase::Precommit, timer).await;

        let precommit_ballots = merge_one_per_voter(
            &self.vote_box.votes_for(height, round, VotePhase::Precommit),
            &carried_commits,
        );
        let precommit_tally = count_votes(&precommit_ballots, ledger);

        // --- Commit / Finalize -------------------------------------------
        match precommit_tally {
            TallyResult::Quorum { block_id } if block_id != NIL_BLOCK_ID => {
                let winner = self
                    .locked
                    .clone()
                    .filter(|l| l.block.id() == block_id)
                    .map(|l| l.block)
                    .or(proposed_block)?;
                self.cast_vote(VotePhase::Commit, height, round, block_id);

                // Finalize: tally commits (this round's own/peers' plus any
                // carried over from earlier rounds of this height); if short,
                // wait one more DELTA for laggards and retally.
                let mut attempts = 0;
                loop {
                    let commit_ballots = merge_one_per_voter(
                        &self.vote_box.votes_for(height, round, VotePhase::Commit),
                        &carried_commits,
                    );
                    let reached = matches!(
                        count_votes(&commit_ballots, ledger),
                        TallyResult::Quorum { block_id: tallied } if tallied == block_id
                    );
                    if reached {
                        break;
                    }
                    attempts += 1;
                    if attempts > FINALIZE_MAX_RETRIES {
                        warn!(height, round, "commit quorum not confirmed after max retries, installing anyway");
                        break;
                    }
                    self.collect_phase(height, round, VotePhase::Commit, DELTA).await;
                }

                sleep(COMMIT_TIME).await;
                info!(height, %round, block = %winner.hash_hex(), "committed");
                self.mempool.remove_all(&winner.transactions.iter().map(|t| t.id.clone()).collect::<Vec<_>>());
                Some(winner)
            }
            _ => {
                warn!(height, round, "round failed to reach precommit quorum, advancing");
                None
            }
        }
    }

    fn build_proposal_block(&mut self, parent: &Block) -> Block {
        if let Some(locked) = &self.locked {
            // Proof-of-lock: a validator that locked on a value in an
            // earlier round of this height must re-propose it if selected
            // as proposer again.
            return Block::new(
                parent,
                locked.block.transactions.clone(),
                self.address,
                locked.block.header.timestamp,
            );
        }
        let txs = self.mempool.drain_for_proposal(crate::config::MAX_TXS_PER_BLOCK);
        let timestamp = chrono::Utc::now().timestamp_millis() as u64;
        Block::new(parent, txs, self.address, timestamp)
    }

    /// Which block ID to prevote for: the locked value if one is still
    /// held, the proposal's block ID if a valid proposal arrived, otherwise
    /// NIL. A lock stays in force across every later round of the height
    /// until precommit releases it on a NIL quorum.
    fn decide_prevote_target(&self, proposed_block: &Option<Block>) -> [u8; 32] {
        if let Some(locked) = &self.locked {
            return locked.block.id();
        }
        match proposed_block {
            Some(block) => block.id(),
            None => NIL_BLOCK_ID,
        }
    }

    fn cast_vote(&mut self, phase: VotePhase, height: u64, round: u64, block_id: [u8; 32]) {
        let mut vote = Vote::new(self.address, height, round, phase, block_id, self.keypair.public_key());
        vote.sign(&self.keypair);
        let channel = match phase {
            VotePhase::Prevote => CHANNEL_PREVOTE,
            VotePhase::Precommit => CHANNEL_PRECOMMIT,
            VotePhase::Commit => CHANNEL_COMMIT,
        };
        self.broadcast(channel, &vote);
        self.vote_box.record(vote, height, round);
    }

    async fn await_proposal(
        &mut self,
        parent: &Block,
        proposer: Address,
        height: u64,
        round: u64,
        timer: Duration,
    ) -> Option<Block> {
        let deadline = sleep(timer);
        tokio::pin!(deadline);
        loop {
            tokio::select! {
                _ = &mut deadline => return None,
                msg = self.inbox.recv() => {
                    let Some(msg) = msg else { return None };
                    if msg.channel != CHANNEL_BLOCK_PROPOSAL {
                        continue;
                    }
                    let Ok(proposal) = bincode::deserialize::<Proposal>(&msg.payload) else { continue };
                    if proposal.from != proposer || proposal.height != height || proposal.round != round {
                        continue;
                    }
                    if !proposal.is_valid() || !proposal.block.rerun(parent) {
                        continue;
                    }
                    return Some(proposal.block);
                }
            }
        }
    }

    async fn collect_phase(&mut self, height: u64, round: u64, phase: VotePhase, timer: Duration) {
        let channel = match phase {
            VotePhase::Prevote => CHANNEL_PREVOTE,
            VotePhase::Precommit => CHANNEL_PRECOMMIT,
            VotePhase::Commit => CHANNEL_COMMIT,
        };
        let deadline = sleep(timer);
        tokio::pin!(deadline);
        loop {
            tokio::select! {
                _ = &mut deadline => return,
                msg = self.inbox.recv() => {
                    let Some(msg) = msg else { return };
                    if msg.channel != channel {
                        continue;
                    }
                    let Ok(vote) = bincode::deserialize::<Vote>(&msg.payload) else { continue };
                    match self.vote_box.record(vote, height, round) {
                        RecordOutcome::Equivocation { first, second } => {
                            warn!(from = %first.from.to_hex(), "equivocation detected");
                            if let Some(tx) = crate::consensus::evidence::build_evidence_transaction(
                                self.address,
                                first.from,
                                &first,
                                &second,
                            ) {
                                let mut tx = tx.build();
                                crate::transaction::sign_transaction(&mut tx, &self.keypair);
                                let _ = self.mempool.insert(tx);
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    fn broadcast<T: serde::Serialize>(&self, channel: &'static str, value: &T) {
        if let Ok(bytes) = bincode::serialize(value) {
            self.network.broadcast(&self.address.to_hex(), channel, bytes);
        }
    }
}

/// Builds the genesis chain from a starting stake distribution — shared by
/// the engine's own tests and by the node binary.
pub fn genesis_chain(starting_stake: BTreeMap<Address, u64>) -> Chain {
    Chain::new(Block::genesis(starting_stake))
}

/// Merges two ballot buckets for the same `(height, phase-equivalent)` so
/// each voter contributes at most one ballot to a tally: `primary` ballots
/// win over `fallback` ballots from the same voter.
fn merge_one_per_voter<'a>(primary: &[&'a Vote], fallback: &[&'a Vote]) -> Vec<&'a Vote> {
    let mut by_voter: std::collections::HashMap<Address, &'a Vote> = std::collections::HashMap::new();
    for vote in fallback {
        by_voter.insert(vote.from, vote);
    }
    for vote in primary {
        by_voter.insert(vote.from, vote);
    }
    by_voter.into_values().collect()
}
