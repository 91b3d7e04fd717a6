//! Thread-safe ledger handle.
//!
//! Every operation takes one global lock for its whole duration, so the
//! read-modify-write of a lockup's `claimed` flag and the surplus check of an
//! administrative withdrawal can never interleave with another operation.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::admin::AdminGate;
use crate::custody::AssetCustody;
use crate::error::LedgerError;
use crate::ledger::Ledger;
use crate::lockup::LockupInfo;
use crate::time_source::TimeSource;
use crate::types::{AccountId, Amount, Asset};

pub struct SharedLedger<C, G, T> {
    inner: Arc<Mutex<Ledger<C, G, T>>>,
}

impl<C, G, T> Clone for SharedLedger<C, G, T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<C, G, T> SharedLedger<C, G, T>
where
    C: AssetCustody,
    G: AdminGate,
    T: TimeSource,
{
    pub fn new(ledger: Ledger<C, G, T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    pub fn deposit(&self, caller: &AccountId, amount: Amount) -> Result<usize, LedgerError> {
        self.inner.lock().deposit(caller, amount)
    }

    pub fn claim(&self, caller: &AccountId, index: usize) -> Result<Amount, LedgerError> {
        self.inner.lock().claim(caller, index)
    }

    pub fn claim_for(
        &self,
        caller: &AccountId,
        owner: &AccountId,
        index: usize,
    ) -> Result<Amount, LedgerError> {
        self.inner.lock().claim_for(caller, owner, index)
    }

    pub fn lockup_count(&self, owner: &AccountId) -> usize {
        self.inner.lock().lockup_count(owner)
    }

    pub fn lockup(&self, owner: &AccountId, index: usize) -> Result<LockupInfo, LedgerError> {
        self.inner.lock().lockup(owner, index)
    }

    pub fn locked_total(&self) -> Amount {
        self.inner.lock().locked_total()
    }

    pub fn withdraw_custodied_asset(&self, caller: &AccountId, amount: Amount) -> Result<(), LedgerError> {
        self.inner.lock().withdraw_custodied_asset(caller, amount)
    }

    pub fn withdraw_other_asset(
        &self,
        caller: &AccountId,
        asset: &Asset,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.inner.lock().withdraw_other_asset(caller, asset, amount)
    }

    pub fn withdraw_native(&self, caller: &AccountId, amount: Amount) -> Result<(), LedgerError> {
        self.inner.lock().withdraw_native(caller, amount)
    }

    /// Exclusive access for multi-step inspection. Holding the guard blocks
    /// every other operation.
    pub fn lock(&self) -> MutexGuard<'_, Ledger<C, G, T>> {
        self.inner.lock()
    }
}
