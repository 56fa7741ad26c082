//! Ledger errors.

use thiserror::Error;

/// Errors that can occur in the ledger store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Height 0 only ever holds the genesis block.
    #[error("Height 0 is reserved for genesis (miner {miner_id})")]
    GenesisReserved { miner_id: u32 },

    #[error("Block height {height} is too far above the top ({top})")]
    HeightGap { height: u64, top: u64 },
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
