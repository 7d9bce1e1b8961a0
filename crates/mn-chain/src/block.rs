use chrono::Utc;
use mn_digest::{digest, zero_digest};
use mn_event::{validate_event, Event, EventKind};
use serde::{Deserialize, Serialize};

use crate::{ChainError, INITIAL_EVENT_CAPACITY, MAX_EVENTS};

/// The unit of commitment: a header, an ordered list of events, a mined
/// nonce, and the resulting hash.
///
/// The Merkle root of `events` is committed in `merkle_root`, and the hash
/// covers `index || timestamp || previous_hash || merkle_root || nonce` —
/// event contents reach the hash only through the Merkle root. Both fields
/// are kept current by every mutating operation, so a block whose stored
/// values no longer match recomputation has been tampered with.
///
/// Blocks are plain owned values; `clone` yields a fully detached deep copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Position in the chain; genesis is 0.
    pub index: u64,

    /// Unix timestamp (seconds) when this block was created.
    pub timestamp: i64,

    /// Hash of the preceding block; all-zero for genesis.
    pub previous_hash: String,

    /// Events bundled in this block, in append order.
    pub events: Vec<Event>,

    /// Proof-of-work counter found by mining.
    pub nonce: u64,

    /// Merkle root of the event digests; all-zero when `events` is empty.
    pub merkle_root: String,

    /// Digest of the header fields, cached so readers need not recompute.
    pub hash: String,
}

impl Block {
    /// Create an empty staging block on top of `previous_hash`.
    pub fn new(index: u64, previous_hash: String) -> Self {
        let mut block = Self {
            index,
            timestamp: Utc::now().timestamp(),
            previous_hash,
            events: Vec::with_capacity(INITIAL_EVENT_CAPACITY),
            nonce: 0,
            merkle_root: String::new(),
            hash: String::new(),
        };
        block.refresh();
        block
    }

    /// The genesis block.
    ///
    /// Pinned to timestamp 0 so every chain in the process starts from a
    /// bit-identical block; without a shared ancestor no broadcast block
    /// would ever find a parent on a peer. Genesis is the one block exempt
    /// from the difficulty requirement.
    pub fn genesis() -> Self {
        let mut block = Self {
            index: 0,
            timestamp: 0,
            previous_hash: zero_digest(),
            events: Vec::with_capacity(INITIAL_EVENT_CAPACITY),
            nonce: 0,
            merkle_root: String::new(),
            hash: String::new(),
        };
        block.refresh();
        block
    }

    /// Append an event, growing the buffer by doubling up to [`MAX_EVENTS`].
    ///
    /// Fails with [`ChainError::BlockFull`] once the cap is reached. On
    /// success the Merkle root and hash are recomputed, so the block's hash
    /// changes on every successful append.
    pub fn append_event(&mut self, kind: EventKind, payload: Vec<u8>) -> Result<(), ChainError> {
        if self.events.len() >= MAX_EVENTS {
            return Err(ChainError::BlockFull);
        }
        if self.events.len() == self.events.capacity() {
            let grown = (self.events.capacity() * 2).min(MAX_EVENTS);
            self.events.reserve_exact(grown - self.events.len());
        }

        self.events.push(Event::new(kind, payload)?);
        self.refresh();
        Ok(())
    }

    /// Recompute and store the Merkle root and hash from current contents.
    pub fn refresh(&mut self) {
        self.merkle_root = self.compute_merkle_root();
        self.hash = self.compute_hash();
    }

    /// Merkle root over the event digests; the zero sentinel for an empty
    /// block (computed without invoking the tree builder).
    pub fn compute_merkle_root(&self) -> String {
        if self.events.is_empty() {
            return zero_digest();
        }
        let leaves: Vec<String> = self.events.iter().map(|e| e.digest.clone()).collect();
        mn_merkle::merkle_root(&leaves).expect("leaf set is non-empty")
    }

    /// Digest of the header fields with the current nonce.
    pub fn compute_hash(&self) -> String {
        let header = format!(
            "{}{}{}{}{}",
            self.index, self.timestamp, self.previous_hash, self.merkle_root, self.nonce
        );
        digest(header.as_bytes())
    }

    /// True iff the hash starts with at least `difficulty` `'0'` characters.
    pub fn meets_difficulty(&self, difficulty: usize) -> bool {
        self.hash.len() >= difficulty && self.hash.bytes().take(difficulty).all(|b| b == b'0')
    }

    /// True iff every event passes [`validate_event`].
    pub fn events_valid(&self) -> bool {
        self.events.iter().all(validate_event)
    }

    /// Integrity check: every stored digest matches recomputation.
    ///
    /// A tampered block fails here — its event digests, Merkle root, and
    /// hash can no longer all agree with the block's contents. Peers run
    /// this on every block received via broadcast.
    pub fn verify(&self) -> bool {
        self.events.iter().all(|e| e.digest == e.compute_digest())
            && self.merkle_root == self.compute_merkle_root()
            && self.hash == self.compute_hash()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_is_shared_and_consistent() {
        let a = Block::genesis();
        let b = Block::genesis();
        assert_eq!(a, b);
        assert_eq!(a.index, 0);
        assert_eq!(a.previous_hash, zero_digest());
        assert_eq!(a.merkle_root, zero_digest());
        assert!(a.verify());
    }

    #[test]
    fn empty_block_has_zero_merkle_root() {
        let block = Block::new(1, zero_digest());
        assert_eq!(block.merkle_root, zero_digest());
    }

    #[test]
    fn append_changes_the_hash() {
        let mut block = Block::new(1, zero_digest());
        let before = block.hash.clone();
        block
            .append_event(EventKind::Transfer, b"one".to_vec())
            .unwrap();
        assert_ne!(block.hash, before);

        let middle = block.hash.clone();
        block
            .append_event(EventKind::Contract, b"two".to_vec())
            .unwrap();
        assert_ne!(block.hash, middle);
    }

    #[test]
    fn single_event_merkle_root_is_the_event_digest() {
        let mut block = Block::new(1, zero_digest());
        block
            .append_event(EventKind::Transfer, b"solo".to_vec())
            .unwrap();
        assert_eq!(block.merkle_root, block.events[0].digest);
    }

    #[test]
    fn two_event_merkle_root_pairs_the_digests() {
        let mut block = Block::new(1, zero_digest());
        block.append_event(EventKind::Transfer, b"a".to_vec()).unwrap();
        block.append_event(EventKind::Transfer, b"b".to_vec()).unwrap();
        let expected = digest(
            format!("{}{}", block.events[0].digest, block.events[1].digest).as_bytes(),
        );
        assert_eq!(block.merkle_root, expected);
    }

    #[test]
    fn block_full_at_the_event_cap() {
        let mut block = Block::new(1, zero_digest());
        for i in 0..MAX_EVENTS {
            block
                .append_event(EventKind::Transfer, vec![i as u8])
                .unwrap();
        }
        assert!(matches!(
            block.append_event(EventKind::Transfer, b"overflow".to_vec()),
            Err(ChainError::BlockFull)
        ));
        assert_eq!(block.events.len(), MAX_EVENTS);
    }

    #[test]
    fn clone_is_a_deep_detached_copy() {
        let mut block = Block::new(3, zero_digest());
        block
            .append_event(EventKind::Transfer, b"payload".to_vec())
            .unwrap();

        let mut copy = block.clone();
        assert_eq!(copy, block);

        // Round-trip: recomputing on the copy reproduces identical fields.
        copy.refresh();
        assert_eq!(copy.merkle_root, block.merkle_root);
        assert_eq!(copy.hash, block.hash);

        // Mutating the copy leaves the source block untouched.
        copy.events[0].payload = b"changed".to_vec();
        assert_eq!(block.events[0].payload, b"payload");
    }

    #[test]
    fn meets_difficulty_checks_leading_zeros() {
        let mut block = Block::new(1, zero_digest());
        block.hash = format!("00{}", &"f".repeat(62));
        assert!(block.meets_difficulty(2));
        assert!(!block.meets_difficulty(3));
        // Idempotent on an unmodified block.
        assert!(block.meets_difficulty(2));
    }

    #[test]
    fn verify_detects_a_tampered_event() {
        let mut block = Block::new(1, zero_digest());
        block
            .append_event(EventKind::Transfer, b"honest".to_vec())
            .unwrap();
        assert!(block.verify());

        block.events[0].payload = b"forged".to_vec();
        block.events[0].digest = block.events[0].compute_digest();
        // Event digest is self-consistent, but the Merkle root is now stale.
        assert!(!block.verify());
    }
}
