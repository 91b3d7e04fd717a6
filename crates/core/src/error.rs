use crate::custody::CustodyError;
use crate::types::{AccountId, Amount, Asset};

/// Errors returned by ledger operations.
///
/// Every variant rejects the whole operation: no lockup is appended, no flag
/// is flipped and no funds move.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("amount must be greater than zero")]
    InsufficientAmount,
    #[error("nothing to claim for lockup {index} of {owner}")]
    NothingToClaim { owner: AccountId, index: usize },
    #[error("lockup index {index} out of range for {owner} ({len} lockups)")]
    IndexOutOfRange {
        owner: AccountId,
        index: usize,
        len: usize,
    },
    #[error("{caller} is not authorized for this operation")]
    Unauthorized { caller: AccountId },
    #[error("withdrawal of {requested} would touch locked funds (surplus {surplus})")]
    LockedFundsProtected { requested: Amount, surplus: Amount },
    #[error("insufficient {asset} balance: requested {requested}, held {available}")]
    InsufficientExternalBalance {
        asset: Asset,
        requested: Amount,
        available: Amount,
    },
    #[error("asset transfer failed: {0}")]
    Custody(#[from] CustodyError),
    #[error("corrupt lockup snapshot: {0}")]
    CorruptSnapshot(String),
}
