//! Lockup records and the per-account book holding them.
//!
//! The book is append-only: a lockup, once pushed onto its owner's sequence,
//! keeps its index forever and only its `claimed` flag ever changes
//! (false → true). The book also tracks the aggregate amount still locked,
//! which bounds what the admin may recover of the custodied asset.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::types::{AccountId, Amount, Timestamp};

/// Delay between deposit and maturity: 180 days.
pub const MATURITY_DELAY: Duration = Duration::from_secs(15_552_000);

/// One deposit event.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Lockup {
    pub owner: AccountId,
    pub amount: Amount,
    pub created_at: Timestamp,
    pub unlock_at: Timestamp,
    pub claimed: bool,
}

impl Lockup {
    fn new(owner: AccountId, amount: Amount, now: Timestamp) -> Self {
        Self {
            owner,
            amount,
            created_at: now,
            unlock_at: now.saturating_add(MATURITY_DELAY.as_secs()),
            claimed: false,
        }
    }

    pub fn is_matured(&self, now: Timestamp) -> bool {
        now >= self.unlock_at
    }

    pub fn is_claimable(&self, now: Timestamp) -> bool {
        !self.claimed && self.is_matured(now)
    }

    pub fn info(&self) -> LockupInfo {
        LockupInfo {
            amount: self.amount,
            created_at: self.created_at,
            unlock_at: self.unlock_at,
            claimed: self.claimed,
        }
    }
}

/// Public view of a lockup, as returned by queries.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct LockupInfo {
    pub amount: Amount,
    pub created_at: Timestamp,
    pub unlock_at: Timestamp,
    pub claimed: bool,
}

/// Serializable form of a [`LockupBook`].
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LockupSnapshot {
    pub accounts: BTreeMap<AccountId, Vec<Lockup>>,
}

/// All lockups, keyed by owner, plus the running locked total.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LockupBook {
    accounts: BTreeMap<AccountId, Vec<Lockup>>,
    /// Sum of `amount` over unclaimed lockups.
    locked_total: Amount,
}

impl LockupBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a book from a snapshot, recomputing the locked total.
    ///
    /// Rejects snapshots that could not have been produced by the ledger:
    /// zero amounts, lockups filed under the wrong owner, or an unlock time
    /// that does not match the maturity delay.
    pub fn from_snapshot(snapshot: LockupSnapshot) -> Result<Self, LedgerError> {
        let mut locked_total: Amount = 0;
        for (owner, lockups) in &snapshot.accounts {
            for (index, lockup) in lockups.iter().enumerate() {
                if lockup.amount == 0 {
                    return Err(LedgerError::CorruptSnapshot(format!(
                        "lockup {index} of {owner} has zero amount"
                    )));
                }
                if &lockup.owner != owner {
                    return Err(LedgerError::CorruptSnapshot(format!(
                        "lockup {index} of {owner} is owned by {}",
                        lockup.owner
                    )));
                }
                let expected_unlock = lockup
                    .created_at
                    .saturating_add(MATURITY_DELAY.as_secs());
                if lockup.unlock_at != expected_unlock {
                    return Err(LedgerError::CorruptSnapshot(format!(
                        "lockup {index} of {owner} unlocks at {} instead of {expected_unlock}",
                        lockup.unlock_at
                    )));
                }
                if !lockup.claimed {
                    locked_total = locked_total.checked_add(lockup.amount).ok_or_else(|| {
                        LedgerError::CorruptSnapshot("locked total overflows".to_string())
                    })?;
                }
            }
        }
        Ok(Self {
            accounts: snapshot.accounts,
            locked_total,
        })
    }

    pub fn snapshot(&self) -> LockupSnapshot {
        LockupSnapshot {
            accounts: self.accounts.clone(),
        }
    }

    /// Append a new lockup for `owner` and return its index.
    ///
    /// Callers have already rejected zero amounts and pulled the funds.
    pub(crate) fn append(&mut self, owner: &AccountId, amount: Amount, now: Timestamp) -> usize {
        let lockups = self.accounts.entry(owner.clone()).or_default();
        lockups.push(Lockup::new(owner.clone(), amount, now));
        // Bounded by the custody balance backing every lockup.
        self.locked_total = self.locked_total.saturating_add(amount);
        lockups.len() - 1
    }

    /// Validate a claim and mark the lockup claimed. Returns the amount to
    /// pay out.
    ///
    /// Checks run in order: index bounds, ownership, then claimability.
    pub(crate) fn mark_claimed(
        &mut self,
        caller: &AccountId,
        owner: &AccountId,
        index: usize,
        now: Timestamp,
    ) -> Result<Amount, LedgerError> {
        let lockup = self.get_mut(owner, index)?;
        if &lockup.owner != caller {
            return Err(LedgerError::Unauthorized {
                caller: caller.clone(),
            });
        }
        if !lockup.is_claimable(now) {
            return Err(LedgerError::NothingToClaim {
                owner: owner.clone(),
                index,
            });
        }
        lockup.claimed = true;
        let amount = lockup.amount;
        self.locked_total -= amount;
        Ok(amount)
    }

    /// Undo [`Self::mark_claimed`] when the payout could not be sent, so the
    /// failed claim leaves no trace.
    pub(crate) fn unmark_claimed(&mut self, owner: &AccountId, index: usize) {
        let restored = match self.get_mut(owner, index) {
            Ok(lockup) if lockup.claimed => {
                lockup.claimed = false;
                lockup.amount
            }
            _ => return,
        };
        self.locked_total += restored;
    }

    pub fn get(&self, owner: &AccountId, index: usize) -> Result<&Lockup, LedgerError> {
        let lockups = self.lockups(owner);
        lockups.get(index).ok_or_else(|| LedgerError::IndexOutOfRange {
            owner: owner.clone(),
            index,
            len: lockups.len(),
        })
    }

    fn get_mut(&mut self, owner: &AccountId, index: usize) -> Result<&mut Lockup, LedgerError> {
        let len = self.count(owner);
        self.accounts
            .get_mut(owner)
            .and_then(|lockups| lockups.get_mut(index))
            .ok_or_else(|| LedgerError::IndexOutOfRange {
                owner: owner.clone(),
                index,
                len,
            })
    }

    pub fn count(&self, owner: &AccountId) -> usize {
        self.accounts.get(owner).map_or(0, Vec::len)
    }

    pub fn lockups(&self, owner: &AccountId) -> &[Lockup] {
        self.accounts.get(owner).map_or(&[], Vec::as_slice)
    }

    pub fn owners(&self) -> impl Iterator<Item = &AccountId> {
        self.accounts.keys()
    }

    pub fn locked_total(&self) -> Amount {
        self.locked_total
    }

    /// Recompute the locked total from scratch. Always equals
    /// [`Self::locked_total`].
    pub fn sum_unclaimed(&self) -> Amount {
        self.accounts
            .values()
            .flatten()
            .filter(|lockup| !lockup.claimed)
            .map(|lockup| lockup.amount)
            .sum()
    }
}
