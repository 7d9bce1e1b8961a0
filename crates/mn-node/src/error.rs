use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("the network is at capacity ({0} nodes)")]
    NetworkFull(usize),

    #[error("no node with id {0}")]
    UnknownNode(usize),

    #[error("chain error: {0}")]
    Chain(#[from] mn_chain::ChainError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
