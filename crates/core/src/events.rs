use serde::Serialize;

use crate::types::{AccountId, Amount};

/// Observable notifications published by the ledger. Nothing in the ledger
/// reads them back.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    Deposited {
        owner: AccountId,
        index: usize,
        amount: Amount,
    },
    Claimed {
        owner: AccountId,
        index: usize,
        amount: Amount,
    },
}
