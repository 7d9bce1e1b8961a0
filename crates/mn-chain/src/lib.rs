pub mod block;
pub mod chain;
pub mod error;
pub mod miner;

pub use block::Block;
pub use chain::Chain;
pub use error::ChainError;

/// Number of leading `'0'` hex characters a mined block's hash must carry.
pub const DIFFICULTY: usize = 2;

/// Hard cap on events per block.
pub const MAX_EVENTS: usize = 100;

/// Starting event capacity of a staging block; doubles as events arrive,
/// never growing past [`MAX_EVENTS`].
pub const INITIAL_EVENT_CAPACITY: usize = 10;
