use std::sync::Arc;
use std::thread;
use std::time::Duration;

use mn_chain::{miner, DIFFICULTY};
use rand::Rng;
use tracing::{debug, info};

use crate::{Network, Node};

/// Idle pause between mining rounds.
const IDLE: Duration = Duration::from_millis(50);

/// Percent chance per round that a malicious node rewrites history.
const TAMPER_PCT: u32 = 5;

/// The mining loop run by each active miner's thread.
///
/// Every round clones the staging block under the chain lock, mines the
/// clone with no locks held, and tries to commit. The commit succeeds only
/// if the tip is still the block the clone was mined against; a won race is
/// followed by a broadcast, a lost one by silently dropping the clone.
/// Failures stay inside the thread — nothing unwinds across it.
pub(crate) fn run(network: &Arc<Network>, node: &Arc<Node>) {
    info!(node = node.id, "worker started");

    while !network.is_shut_down() && node.is_active() {
        let mut candidate = node.chain.lock().unwrap().clone_staging();

        let mined = miner::mine(&mut candidate, DIFFICULTY, network.shutdown_flag());
        if mined && node.is_active() {
            let committed = node.chain.lock().unwrap().commit_mined(&candidate);
            if committed {
                info!(
                    node = node.id,
                    block = candidate.index,
                    nonce = candidate.nonce,
                    hash = %candidate.hash,
                    "mined block"
                );
                network.broadcast(&candidate, node.id);
            } else {
                debug!(node = node.id, block = candidate.index, "mined block lost the race");
            }
        }

        if node.is_malicious && rand::thread_rng().gen_range(0..100) < TAMPER_PCT {
            node.tamper();
        }

        thread::sleep(IDLE);
    }

    info!(node = node.id, "worker stopped");
}
