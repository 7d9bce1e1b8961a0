use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;

use mn_chain::{miner, Block, Chain, ChainError, DIFFICULTY};
use mn_event::EventKind;
use tracing::{debug, info, warn};

use crate::{worker, Node, NodeError, CONSENSUS_THRESHOLD, MAX_NODES};

/// The static set of peers plus the process-wide shutdown switch.
///
/// The nodes table is append-only with stable iteration order; the table
/// lock is always taken before any chain lock. Pass the network around as
/// an `Arc` — workers hold a clone so they can broadcast.
pub struct Network {
    nodes: Mutex<Vec<Arc<Node>>>,
    shutdown: AtomicBool,
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

impl Network {
    pub fn new() -> Self {
        Self {
            nodes: Mutex::new(Vec::new()),
            shutdown: AtomicBool::new(false),
        }
    }

    /// Register a new node and, for miners, start its worker thread.
    pub fn add_node(
        self: &Arc<Self>,
        is_mining: bool,
        is_malicious: bool,
    ) -> Result<Arc<Node>, NodeError> {
        let mut nodes = self.nodes.lock().unwrap();
        if nodes.len() >= MAX_NODES {
            return Err(NodeError::NetworkFull(MAX_NODES));
        }

        let node = Arc::new(Node::new(nodes.len(), is_mining, is_malicious));
        nodes.push(Arc::clone(&node));
        drop(nodes);

        info!(
            node = node.id,
            mining = node.is_mining,
            malicious = node.is_malicious,
            "node registered"
        );
        if node.is_mining {
            self.spawn_worker(&node)?;
        }
        Ok(node)
    }

    /// Look up a node by id.
    pub fn node(&self, id: usize) -> Option<Arc<Node>> {
        self.nodes.lock().unwrap().get(id).cloned()
    }

    /// Snapshot of the nodes table.
    pub fn nodes(&self) -> Vec<Arc<Node>> {
        self.nodes.lock().unwrap().clone()
    }

    /// Take a node offline and wait for its worker to finish.
    ///
    /// An out-of-range id is a logged no-op.
    pub fn stop_node(&self, id: usize) {
        let Some(node) = self.node(id) else {
            warn!(node = id, "stop requested for unknown node");
            return;
        };

        node.set_active(false);
        let handle = node.worker.lock().unwrap().take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
        info!(node = id, "node stopped");
    }

    /// Bring a stopped node back online and catch it up with the network.
    ///
    /// An out-of-range id is a logged no-op; so is starting a node that is
    /// already active.
    pub fn start_node(self: &Arc<Self>, id: usize) {
        let Some(node) = self.node(id) else {
            warn!(node = id, "start requested for unknown node");
            return;
        };
        if node.is_active() {
            return;
        }

        node.set_active(true);
        if node.is_mining {
            if let Err(error) = self.spawn_worker(&node) {
                warn!(node = id, %error, "failed to restart worker");
            }
        }
        info!(node = id, "node restarted");
        self.synchronize(&node);
    }

    /// Append an event to a node's staging block.
    ///
    /// When the staging block is full it is detached and mined with the
    /// chain lock released — mining is CPU-bound and must not stall other
    /// writers. After mining, the block is committed only if the tip is
    /// still the one it was mined against; otherwise it is dropped without
    /// comment (a peer's block was adopted meanwhile). The append is then
    /// retried against the current staging block, and the result of that
    /// final attempt is returned.
    pub fn submit_event(
        &self,
        node_id: usize,
        kind: EventKind,
        payload: Vec<u8>,
    ) -> Result<(), NodeError> {
        let node = self.node(node_id).ok_or(NodeError::UnknownNode(node_id))?;

        let mut chain = node.chain.lock().unwrap();
        match chain.stage_event(kind, payload.clone()) {
            Ok(()) => Ok(()),
            Err(ChainError::BlockFull) => {
                let mut full = chain.detach_staging();
                drop(chain);

                let mined = miner::mine(&mut full, DIFFICULTY, &self.shutdown);

                let mut chain = node.chain.lock().unwrap();
                if mined {
                    if chain.commit_detached(&full) {
                        info!(node = node_id, block = full.index, "committed full block");
                    } else {
                        debug!(node = node_id, block = full.index, "full block lost the race");
                    }
                }
                chain.stage_event(kind, payload)?;
                Ok(())
            }
            Err(error) => Err(error.into()),
        }
    }

    /// Offer a freshly mined block to every active peer except the sender.
    ///
    /// Each peer applies its own acceptance rule under its own chain lock;
    /// refusals are silent. Receivers keep deep copies, never the sender's
    /// block itself.
    pub fn broadcast(&self, block: &Block, sender_id: usize) {
        let nodes = self.nodes.lock().unwrap();
        for peer in nodes.iter() {
            if peer.id == sender_id || !peer.is_active() {
                continue;
            }
            let adopted = peer.chain.lock().unwrap().adopt(block, DIFFICULTY);
            if adopted {
                debug!(peer = peer.id, block = block.index, "adopted broadcast block");
            } else {
                debug!(peer = peer.id, block = block.index, "refused broadcast block");
            }
        }
    }

    /// Replace a node's chain with the longest one held by an active peer.
    ///
    /// Called when a node comes back online after downtime. Does nothing
    /// when no other node is active.
    pub fn synchronize(&self, node: &Node) {
        let nodes = self.nodes.lock().unwrap();

        let mut best: Option<&Arc<Node>> = None;
        let mut best_len = 0;
        for peer in nodes.iter() {
            if peer.id == node.id || !peer.is_active() {
                continue;
            }
            let len = peer.chain.lock().unwrap().len();
            if len > best_len {
                best_len = len;
                best = Some(peer);
            }
        }
        let Some(best) = best else {
            return;
        };

        let (mut ours, theirs) = lock_pair(node, best);
        ours.replace_with(&theirs);
        info!(
            node = node.id,
            peer = best.id,
            len = best_len,
            "synchronized with longest chain"
        );
    }

    /// Whether at least [`CONSENSUS_THRESHOLD`] of the active nodes hold a
    /// block with `block`'s hash. No active nodes means no consensus.
    pub fn consensus(&self, block: &Block) -> bool {
        let nodes = self.nodes.lock().unwrap();

        let mut active = 0usize;
        let mut holding = 0usize;
        for peer in nodes.iter() {
            if !peer.is_active() {
                continue;
            }
            active += 1;
            if peer.chain.lock().unwrap().contains(&block.hash) {
                holding += 1;
            }
        }

        if active == 0 {
            return false;
        }
        holding as f64 / active as f64 >= CONSENSUS_THRESHOLD
    }

    /// Raise the shutdown flag and wait for every worker to finish.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
        for node in self.nodes() {
            let handle = node.worker.lock().unwrap().take();
            if let Some(handle) = handle {
                let _ = handle.join();
            }
        }
        info!("network shut down");
    }

    pub(crate) fn is_shut_down(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    pub(crate) fn shutdown_flag(&self) -> &AtomicBool {
        &self.shutdown
    }

    fn spawn_worker(self: &Arc<Self>, node: &Arc<Node>) -> Result<(), NodeError> {
        let network = Arc::clone(self);
        let worker_node = Arc::clone(node);
        let handle = thread::Builder::new()
            .name(format!("node-{}", node.id))
            .spawn(move || worker::run(&network, &worker_node))?;
        *node.worker.lock().unwrap() = Some(handle);
        Ok(())
    }
}

/// Lock two chains in node-id order so concurrent synchronizations cannot
/// deadlock. Returns the guards as (first argument's chain, second's).
fn lock_pair<'a>(a: &'a Node, b: &'a Node) -> (MutexGuard<'a, Chain>, MutexGuard<'a, Chain>) {
    if a.id < b.id {
        let ga = a.chain.lock().unwrap();
        let gb = b.chain.lock().unwrap();
        (ga, gb)
    } else {
        let gb = b.chain.lock().unwrap();
        let ga = a.chain.lock().unwrap();
        (ga, gb)
    }
}
