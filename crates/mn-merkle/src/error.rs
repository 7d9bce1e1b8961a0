use thiserror::Error;

#[derive(Debug, Error)]
pub enum MerkleError {
    #[error("no leaves to build a tree from")]
    Empty,
}
