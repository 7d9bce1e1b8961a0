use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use rand::Rng;

use crate::block::Block;

/// How often (in nonces) the search yields, rolls the shortcut die, and
/// polls the shutdown flag.
const NONCE_CHECK_INTERVAL: u64 = 10;

/// Pause per check interval, keeping a miner from monopolising a core.
const MINING_PAUSE: Duration = Duration::from_millis(10);

/// Percent chance per check interval of declaring the current nonce a find,
/// so a simulation run completes in bounded time.
const LUCKY_FIND_PCT: u32 = 1;

/// Mine `block` in place: search for a nonce whose hash meets `difficulty`.
///
/// The Merkle root is recomputed once up front, then only the nonce varies.
/// Returns `false` when `shutdown` was raised mid-search; the caller owns
/// the block either way and decides whether to commit it — mining never
/// touches a chain.
///
/// Two simulation shortcuts pace the search: a 10 ms sleep every
/// [`NONCE_CHECK_INTERVAL`] nonces, and a [`LUCKY_FIND_PCT`] percent chance
/// at each pause of accepting the current nonce outright. A lucky find
/// re-hashes once and returns success even though the hash misses the
/// target; peers will refuse such a block, which is part of the simulated
/// dynamics.
pub fn mine(block: &mut Block, difficulty: usize, shutdown: &AtomicBool) -> bool {
    search(block, difficulty, shutdown, true)
}

fn search(block: &mut Block, difficulty: usize, shutdown: &AtomicBool, paced: bool) -> bool {
    block.nonce = 0;
    block.merkle_root = block.compute_merkle_root();

    loop {
        block.hash = block.compute_hash();
        if block.meets_difficulty(difficulty) {
            return true;
        }
        block.nonce += 1;

        if block.nonce % NONCE_CHECK_INTERVAL != 0 {
            continue;
        }
        if paced {
            thread::sleep(MINING_PAUSE);
            if rand::thread_rng().gen_range(0..100) < LUCKY_FIND_PCT {
                block.hash = block.compute_hash();
                return true;
            }
        }
        if shutdown.load(Ordering::Relaxed) {
            return false;
        }
    }
}

#[cfg(test)]
mod tests {
    use mn_digest::zero_digest;
    use mn_event::EventKind;

    use super::*;

    #[test]
    fn unpaced_search_finds_a_real_proof() {
        let shutdown = AtomicBool::new(false);
        let mut block = Block::new(1, zero_digest());
        block
            .append_event(EventKind::Transfer, b"data".to_vec())
            .unwrap();

        assert!(search(&mut block, 2, &shutdown, false));
        assert!(block.meets_difficulty(2));
        assert_eq!(block.hash, block.compute_hash());
        assert!(block.verify());
    }

    #[test]
    fn search_keeps_the_merkle_root_current() {
        let shutdown = AtomicBool::new(false);
        let mut block = Block::new(1, zero_digest());
        block
            .append_event(EventKind::Transfer, b"data".to_vec())
            .unwrap();
        // Stale on purpose; the miner recomputes before searching.
        block.merkle_root = zero_digest();

        assert!(search(&mut block, 1, &shutdown, false));
        assert_eq!(block.merkle_root, block.compute_merkle_root());
    }

    #[test]
    fn shutdown_aborts_the_search() {
        let shutdown = AtomicBool::new(true);
        let mut block = Block::new(1, zero_digest());

        // An unreachable difficulty: only the shutdown poll can end this.
        assert!(!search(&mut block, mn_digest::HASH_LEN, &shutdown, false));
        assert_eq!(block.nonce % NONCE_CHECK_INTERVAL, 0);
    }

    #[test]
    fn mining_is_repeatable_for_a_fixed_block() {
        let shutdown = AtomicBool::new(false);
        let mut block = Block::new(1, zero_digest());
        assert!(search(&mut block, 2, &shutdown, false));
        let (nonce, hash) = (block.nonce, block.hash.clone());

        // Same contents, same search: the proof is reproducible.
        assert!(search(&mut block, 2, &shutdown, false));
        assert_eq!(block.nonce, nonce);
        assert_eq!(block.hash, hash);
    }
}
