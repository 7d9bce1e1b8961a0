use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::thread::JoinHandle;

use mn_chain::{Block, Chain};
use tracing::warn;

/// The payload a malicious node writes over a committed transfer.
const FORGED_PAYLOAD: &[u8] = br#"{"from":"System","to":"Hacker","amount":1000}"#;

/// One peer in the simulated network.
///
/// A node exclusively owns its chain; peers only ever see deep copies of its
/// blocks. The `active` flag is the node's online/offline switch — the
/// worker thread polls it every iteration and exits once it drops.
pub struct Node {
    /// Unique id, assigned in registration order.
    pub id: usize,

    /// This node's copy of the ledger. All multi-step mutations hold the
    /// guard from first read to last write.
    pub chain: Mutex<Chain>,

    /// Whether this node runs a mining worker while active.
    pub is_mining: bool,

    /// Whether this node occasionally rewrites committed events.
    pub is_malicious: bool,

    active: AtomicBool,
    pub(crate) worker: Mutex<Option<JoinHandle<()>>>,
}

impl Node {
    pub(crate) fn new(id: usize, is_mining: bool, is_malicious: bool) -> Self {
        Self {
            id,
            chain: Mutex::new(Chain::new()),
            is_mining,
            is_malicious,
            active: AtomicBool::new(true),
            worker: Mutex::new(None),
        }
    }

    /// Whether the node is currently online.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    pub(crate) fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Relaxed);
    }

    /// Snapshot of the last committed block.
    pub fn tip(&self) -> Block {
        self.chain.lock().unwrap().tip().clone()
    }

    /// Snapshot of the committed chain length.
    pub fn chain_len(&self) -> usize {
        self.chain.lock().unwrap().len()
    }

    /// Rewrite the first committed transfer event with a forged payload.
    ///
    /// Only the event digest is recomputed; the containing block keeps its
    /// stale Merkle root and hash, so peers refuse it on sight. Returns the
    /// index of the rewritten block, if any.
    pub fn tamper(&self) -> Option<u64> {
        if !self.is_malicious || !self.is_active() {
            return None;
        }

        let index = self
            .chain
            .lock()
            .unwrap()
            .tamper_first_transfer(FORGED_PAYLOAD.to_vec());
        if let Some(index) = index {
            warn!(node = self.id, block = index, "rewrote a committed transfer");
        }
        index
    }
}
