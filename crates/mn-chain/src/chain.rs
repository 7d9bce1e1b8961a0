use mn_event::EventKind;
use serde::{Deserialize, Serialize};

use crate::{block::Block, error::ChainError};

/// One node's copy of the ledger: committed blocks from genesis to tip plus
/// the staging block being filled with events.
///
/// Invariants maintained by this type:
/// - Always contains at least the genesis block.
/// - Every committed block's `previous_hash` matches the hash of the block
///   before it, and indices are contiguous from 0.
/// - The staging block satisfies `staging.index == len()` and
///   `staging.previous_hash == tip().hash`, and is never part of `blocks`.
///
/// The type itself is single-threaded; the owning node wraps it in a
/// `Mutex`, and every multi-step mutation happens under one guard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chain {
    blocks: Vec<Block>,
    staging: Block,
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}

impl Chain {
    /// Initialise a chain with the genesis block and a fresh staging block.
    pub fn new() -> Self {
        let genesis = Block::genesis();
        let staging = Block::new(1, genesis.hash.clone());
        Self {
            blocks: vec![genesis],
            staging,
        }
    }

    /// Number of committed blocks (including genesis).
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// The most recent committed block.
    pub fn tip(&self) -> &Block {
        // Safety: always at least one block (genesis).
        self.blocks.last().unwrap()
    }

    /// All committed blocks, genesis first.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// The block currently being filled with events.
    pub fn staging(&self) -> &Block {
        &self.staging
    }

    /// Append an event to the staging block.
    pub fn stage_event(&mut self, kind: EventKind, payload: Vec<u8>) -> Result<(), ChainError> {
        self.staging.append_event(kind, payload)
    }

    /// Detach the staging block for mining, installing a fresh one on the
    /// current tip in its place.
    pub fn detach_staging(&mut self) -> Block {
        let fresh = Block::new(self.len() as u64, self.tip().hash.clone());
        std::mem::replace(&mut self.staging, fresh)
    }

    /// Deep copy of the staging block for a miner to work on.
    pub fn clone_staging(&self) -> Block {
        self.staging.clone()
    }

    /// Commit a block mined from a staging clone, if the tip is still the
    /// one it was mined against.
    ///
    /// Returns `false` when the race was lost (a peer's block arrived while
    /// mining); the caller drops the stale block. On a win the staging block
    /// is replaced by a fresh empty one — its events were carried into the
    /// mined clone and would otherwise be committed twice.
    pub fn commit_mined(&mut self, block: &Block) -> bool {
        if self.tip().hash != block.previous_hash {
            return false;
        }
        self.blocks.push(block.clone());
        self.reset_staging();
        true
    }

    /// Commit a block that was detached from staging and mined because it
    /// filled up.
    ///
    /// Same race rule as [`Chain::commit_mined`], but the current staging
    /// block is retargeted in place rather than replaced: events staged
    /// while the full block was being mined stay queued for the next block.
    pub fn commit_detached(&mut self, block: &Block) -> bool {
        if self.tip().hash != block.previous_hash {
            return false;
        }
        self.blocks.push(block.clone());
        self.retarget_staging();
        true
    }

    /// Commit the staging block as-is, without a proof-of-work search.
    ///
    /// Driver-facing shortcut: the block's Merkle root and hash are
    /// finalized, but no nonce is searched, so the committed block will not
    /// meet the difficulty target and peers will not adopt it.
    pub fn confirm(&mut self) {
        let mut block = self.detach_staging();
        block.refresh();
        self.blocks.push(block);
        self.reset_staging();
    }

    /// Receiver side of a broadcast: adopt `block` if it checks out and
    /// extends this chain.
    ///
    /// The block must meet the difficulty target, carry only valid events,
    /// match its own digests (see [`Block::verify`]), descend from a block
    /// this chain holds, and advance the committed length. Anything else is
    /// dropped by returning `false`. When the parent sits below the tip the
    /// stale suffix is removed before the copy is linked.
    pub fn adopt(&mut self, block: &Block, difficulty: usize) -> bool {
        if !block.meets_difficulty(difficulty) || !block.events_valid() || !block.verify() {
            return false;
        }
        let Some(parent) = self
            .blocks
            .iter()
            .position(|b| b.hash == block.previous_hash)
        else {
            return false;
        };
        if (block.index + 1) as usize <= self.len() {
            return false;
        }

        self.blocks.truncate(parent + 1);
        self.blocks.push(block.clone());
        self.reset_staging();
        true
    }

    /// Replace this chain wholesale with a deep copy of `other`.
    ///
    /// The longest-chain synchronization path after downtime; the previous
    /// blocks and staging block are discarded.
    pub fn replace_with(&mut self, other: &Chain) {
        self.blocks = other.blocks.clone();
        self.reset_staging();
    }

    /// True iff some committed block has the given hash.
    pub fn contains(&self, hash: &str) -> bool {
        self.blocks.iter().any(|b| b.hash == hash)
    }

    /// Structural and content integrity of the committed blocks: hash links,
    /// contiguous indices, and every block matching its own digests.
    ///
    /// Proof-of-work is deliberately not checked here — genesis is exempt
    /// and locally committed blocks may predate the difficulty rule peers
    /// enforce at adoption.
    pub fn is_valid(&self) -> bool {
        let Some(genesis) = self.blocks.first() else {
            return false;
        };
        if genesis.index != 0 || genesis.previous_hash != mn_digest::zero_digest() {
            return false;
        }

        for window in self.blocks.windows(2) {
            let (prev, next) = (&window[0], &window[1]);
            if next.previous_hash != prev.hash || next.index != prev.index + 1 {
                return false;
            }
        }

        self.blocks.iter().all(Block::verify)
    }

    /// Rewrite the first event of the first non-genesis block with a forged
    /// payload, recomputing only that event's digest.
    ///
    /// The block's Merkle root and hash are left as they were, so the block
    /// no longer matches its own contents and fails [`Block::verify`].
    /// Only applies to [`EventKind::Transfer`] events; returns the index of
    /// the affected block, or `None` when there was nothing to rewrite.
    pub fn tamper_first_transfer(&mut self, payload: Vec<u8>) -> Option<u64> {
        let block = self.blocks.get_mut(1)?;
        let event = block.events.first_mut()?;
        if event.kind != EventKind::Transfer {
            return None;
        }

        event.payload = payload;
        event.digest = event.compute_digest();
        Some(block.index)
    }

    fn reset_staging(&mut self) {
        self.staging = Block::new(self.len() as u64, self.tip().hash.clone());
    }

    fn retarget_staging(&mut self) {
        self.staging.index = self.len() as u64;
        self.staging.previous_hash = self.tip().hash.clone();
        self.staging.refresh();
    }
}
