use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("block already holds the maximum number of events")]
    BlockFull,

    #[error("event error: {0}")]
    Event(#[from] mn_event::EventError),

    #[error("merkle error: {0}")]
    Merkle(#[from] mn_merkle::MerkleError),
}
