//! The lockup ledger: deposits, claims, queries and administrative recovery.
//!
//! ## Claim ordering
//!
//! A claim marks the lockup claimed before the payout is sent. If the payout
//! fails the mark is rolled back, so a failed claim leaves the lockup exactly
//! as it was and a successful one can never be replayed.
//!
//! ## Recovery
//!
//! The admin may withdraw anything the ledger holds except the custodied
//! asset still backing unclaimed lockups. For the custodied asset only the
//! surplus `balance - locked_total` is recoverable.

use crate::admin::{AdminGate, OwnerGate};
use crate::custody::AssetCustody;
use crate::error::LedgerError;
use crate::events::LedgerEvent;
use crate::lockup::{Lockup, LockupBook, LockupInfo, LockupSnapshot};
use crate::time_source::TimeSource;
use crate::types::{AccountId, Amount, Asset, TokenId};

pub struct Ledger<C, G, T> {
    /// Account under which the ledger holds custodied funds.
    account: AccountId,
    custodied: Asset,
    book: LockupBook,
    custody: C,
    gate: G,
    time_source: T,
    events: Vec<LedgerEvent>,
}

impl<C, G, T> Ledger<C, G, T>
where
    C: AssetCustody,
    G: AdminGate,
    T: TimeSource,
{
    pub fn new(account: AccountId, custodied: TokenId, custody: C, gate: G, time_source: T) -> Self {
        Self {
            account,
            custodied: Asset::Token(custodied),
            book: LockupBook::new(),
            custody,
            gate,
            time_source,
            events: Vec::new(),
        }
    }

    /// Resume a ledger from a previously taken snapshot.
    pub fn restore(
        account: AccountId,
        custodied: TokenId,
        snapshot: LockupSnapshot,
        custody: C,
        gate: G,
        time_source: T,
    ) -> Result<Self, LedgerError> {
        let book = LockupBook::from_snapshot(snapshot)?;
        let mut ledger = Self::new(account, custodied, custody, gate, time_source);
        ledger.book = book;
        Ok(ledger)
    }

    // =========================================================================
    // Depositor operations
    // =========================================================================

    /// Lock `amount` of the custodied asset for `caller` and return the new
    /// lockup's index in the caller's sequence.
    ///
    /// The caller must have approved the ledger account for at least
    /// `amount` beforehand.
    pub fn deposit(&mut self, caller: &AccountId, amount: Amount) -> Result<usize, LedgerError> {
        if amount == 0 {
            tracing::debug!(owner = %caller, "Rejected zero-amount deposit");
            return Err(LedgerError::InsufficientAmount);
        }

        self.custody
            .transfer_from(&self.custodied, caller, &self.account, amount)?;

        let now = self.time_source.now();
        let index = self.book.append(caller, amount, now);

        tracing::info!(
            owner = %caller,
            index,
            amount = %amount,
            created_at = now,
            "Lockup created"
        );
        self.events.push(LedgerEvent::Deposited {
            owner: caller.clone(),
            index,
            amount,
        });

        Ok(index)
    }

    /// Claim the caller's own lockup at `index`.
    pub fn claim(&mut self, caller: &AccountId, index: usize) -> Result<Amount, LedgerError> {
        self.claim_for(caller, caller, index)
    }

    /// Claim `owner`'s lockup at `index`. Only succeeds when `caller` owns it,
    /// it is unclaimed, and it has matured. Returns the amount paid out.
    pub fn claim_for(
        &mut self,
        caller: &AccountId,
        owner: &AccountId,
        index: usize,
    ) -> Result<Amount, LedgerError> {
        let now = self.time_source.now();
        let amount = match self.book.mark_claimed(caller, owner, index, now) {
            Ok(amount) => amount,
            Err(e) => {
                tracing::debug!(caller = %caller, owner = %owner, index, error = %e, "Claim rejected");
                return Err(e);
            }
        };

        if let Err(e) = self
            .custody
            .transfer(&self.custodied, &self.account, caller, amount)
        {
            self.book.unmark_claimed(owner, index);
            tracing::warn!(
                owner = %owner,
                index,
                amount = %amount,
                error = %e,
                "Claim payout failed, lockup left unclaimed"
            );
            return Err(e.into());
        }

        tracing::info!(owner = %owner, index, amount = %amount, "Lockup claimed");
        self.events.push(LedgerEvent::Claimed {
            owner: owner.clone(),
            index,
            amount,
        });

        Ok(amount)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn lockup_count(&self, owner: &AccountId) -> usize {
        self.book.count(owner)
    }

    pub fn lockup(&self, owner: &AccountId, index: usize) -> Result<LockupInfo, LedgerError> {
        self.book.get(owner, index).map(Lockup::info)
    }

    /// Every lockup `owner` ever created, in creation order.
    pub fn lockups(&self, owner: &AccountId) -> &[Lockup] {
        self.book.lockups(owner)
    }

    /// Amount of the custodied asset backing unclaimed lockups.
    pub fn locked_total(&self) -> Amount {
        self.book.locked_total()
    }

    /// Custodied asset held beyond what unclaimed lockups require.
    pub fn custodied_surplus(&self) -> Amount {
        self.custody
            .balance_of(&self.custodied, &self.account)
            .saturating_sub(self.book.locked_total())
    }

    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> LockupSnapshot {
        self.book.snapshot()
    }

    pub fn book(&self) -> &LockupBook {
        &self.book
    }

    pub fn account(&self) -> &AccountId {
        &self.account
    }

    pub fn custodied_asset(&self) -> &Asset {
        &self.custodied
    }

    pub fn custody(&self) -> &C {
        &self.custody
    }

    /// Direct access to the asset mechanism, e.g. for funding accounts in a
    /// simulation. Ledger state is not affected.
    pub fn custody_mut(&mut self) -> &mut C {
        &mut self.custody
    }

    pub fn gate(&self) -> &G {
        &self.gate
    }

    pub fn time_source(&self) -> &T {
        &self.time_source
    }

    // =========================================================================
    // Administrative recovery
    // =========================================================================

    /// Withdraw surplus custodied asset to the admin. Funds backing unclaimed
    /// lockups are never released.
    pub fn withdraw_custodied_asset(
        &mut self,
        caller: &AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.ensure_admin(caller)?;
        ensure_positive(amount)?;

        let surplus = self.custodied_surplus();
        if amount > surplus {
            tracing::warn!(
                caller = %caller,
                requested = %amount,
                surplus = %surplus,
                locked = %self.book.locked_total(),
                "Refused withdrawal of locked funds"
            );
            return Err(LedgerError::LockedFundsProtected {
                requested: amount,
                surplus,
            });
        }

        let asset = self.custodied.clone();
        self.send_to(caller, &asset, amount)
    }

    /// Withdraw an asset sent to the ledger by mistake. Requests for the
    /// custodied asset are held to the same surplus rule as
    /// [`Self::withdraw_custodied_asset`].
    pub fn withdraw_other_asset(
        &mut self,
        caller: &AccountId,
        asset: &Asset,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        if asset == &self.custodied {
            return self.withdraw_custodied_asset(caller, amount);
        }
        self.ensure_admin(caller)?;
        ensure_positive(amount)?;
        self.ensure_held(asset, amount)?;
        self.send_to(caller, asset, amount)
    }

    /// Withdraw native currency held by the ledger.
    pub fn withdraw_native(&mut self, caller: &AccountId, amount: Amount) -> Result<(), LedgerError> {
        self.ensure_admin(caller)?;
        ensure_positive(amount)?;
        self.ensure_held(&Asset::Native, amount)?;
        self.send_to(caller, &Asset::Native, amount)
    }

    fn ensure_admin(&self, caller: &AccountId) -> Result<(), LedgerError> {
        if self.gate.is_admin(caller) {
            return Ok(());
        }
        tracing::warn!(caller = %caller, "Rejected administrative call from non-admin");
        Err(LedgerError::Unauthorized {
            caller: caller.clone(),
        })
    }

    fn ensure_held(&self, asset: &Asset, amount: Amount) -> Result<(), LedgerError> {
        let available = self.custody.balance_of(asset, &self.account);
        if available < amount {
            return Err(LedgerError::InsufficientExternalBalance {
                asset: asset.clone(),
                requested: amount,
                available,
            });
        }
        Ok(())
    }

    fn send_to(&mut self, to: &AccountId, asset: &Asset, amount: Amount) -> Result<(), LedgerError> {
        self.custody.transfer(asset, &self.account, to, amount)?;
        tracing::info!(to = %to, asset = %asset, amount = %amount, "Administrative withdrawal");
        Ok(())
    }
}

impl<C, T> Ledger<C, OwnerGate, T>
where
    C: AssetCustody,
    T: TimeSource,
{
    /// Hand the admin role to `new_admin`. Admin-only.
    pub fn transfer_admin(&mut self, caller: &AccountId, new_admin: AccountId) -> Result<(), LedgerError> {
        self.gate.transfer(caller, new_admin)
    }

    /// Give up the admin role for good. Admin-only.
    pub fn renounce_admin(&mut self, caller: &AccountId) -> Result<(), LedgerError> {
        self.gate.renounce(caller)
    }
}

fn ensure_positive(amount: Amount) -> Result<(), LedgerError> {
    if amount == 0 {
        return Err(LedgerError::InsufficientAmount);
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
