use serde::{Deserialize, Serialize};

/// The kinds of record a block can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// A financial transfer between two parties.
    Transfer,
    /// Any other ledger event (contract execution, governance action, ...).
    Contract,
}

impl EventKind {
    /// Numeric code folded into the event digest.
    pub fn code(self) -> u8 {
        match self {
            EventKind::Transfer => 1,
            EventKind::Contract => 2,
        }
    }
}
