//! Asset custody: the transfer mechanism the ledger moves funds through.
//!
//! The ledger never touches balances directly. Deposits pull funds with
//! [`AssetCustody::transfer_from`] (which requires a prior allowance), claims
//! and administrative recovery push funds with [`AssetCustody::transfer`],
//! and the recoverable surplus is computed from [`AssetCustody::balance_of`].
//!
//! [`InMemoryCustody`] is a complete in-process bank used by the CLI
//! simulator and by tests.

use std::collections::HashMap;

use crate::types::{AccountId, Amount, Asset};

// =============================================================================
// Errors
// =============================================================================

/// Failures reported by the asset transfer mechanism.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CustodyError {
    #[error("{account} holds {available} of {asset}, needs {requested}")]
    InsufficientBalance {
        asset: Asset,
        account: AccountId,
        requested: Amount,
        available: Amount,
    },
    #[error("{spender} may spend {allowed} of {owner}'s {asset}, needs {requested}")]
    InsufficientAllowance {
        asset: Asset,
        owner: AccountId,
        spender: AccountId,
        requested: Amount,
        allowed: Amount,
    },
    #[error("balance overflow crediting {account}")]
    Overflow { account: AccountId },
    #[error("{0}")]
    Other(String),
}

// =============================================================================
// Trait: AssetCustody
// =============================================================================

/// Abstraction over the fungible asset ledger for testability.
pub trait AssetCustody {
    /// Move `amount` of `asset` from `from` to `to`, consuming an allowance
    /// `from` granted to `to`.
    fn transfer_from(
        &mut self,
        asset: &Asset,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), CustodyError>;

    /// Move `amount` of `asset` held by `from` to `to`.
    fn transfer(
        &mut self,
        asset: &Asset,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), CustodyError>;

    /// Current balance of `asset` held by `account`.
    fn balance_of(&self, asset: &Asset, account: &AccountId) -> Amount;
}

// =============================================================================
// InMemoryCustody
// =============================================================================

/// In-process asset bank with balances and allowances per asset.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCustody {
    balances: HashMap<(Asset, AccountId), Amount>,
    allowances: HashMap<(Asset, AccountId, AccountId), Amount>,
}

impl InMemoryCustody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `amount` of `asset` out of thin air and credit it to `to`.
    pub fn mint(&mut self, asset: &Asset, to: &AccountId, amount: Amount) -> Result<(), CustodyError> {
        self.credit(asset, to, amount)
    }

    /// Set the allowance `owner` grants `spender` (replaces any previous one).
    pub fn approve(&mut self, asset: &Asset, owner: &AccountId, spender: &AccountId, amount: Amount) {
        self.allowances
            .insert((asset.clone(), owner.clone(), spender.clone()), amount);
    }

    pub fn allowance(&self, asset: &Asset, owner: &AccountId, spender: &AccountId) -> Amount {
        self.allowances
            .get(&(asset.clone(), owner.clone(), spender.clone()))
            .copied()
            .unwrap_or(0)
    }

    /// All non-zero balances held by `account`, sorted by asset.
    pub fn holdings(&self, account: &AccountId) -> Vec<(Asset, Amount)> {
        let mut held: Vec<(Asset, Amount)> = self
            .balances
            .iter()
            .filter(|((_, holder), amount)| holder == account && **amount > 0)
            .map(|((asset, _), amount)| (asset.clone(), *amount))
            .collect();
        held.sort();
        held
    }

    fn credit(&mut self, asset: &Asset, to: &AccountId, amount: Amount) -> Result<(), CustodyError> {
        let balance = self
            .balances
            .entry((asset.clone(), to.clone()))
            .or_default();
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| CustodyError::Overflow { account: to.clone() })?;
        Ok(())
    }

    fn move_funds(
        &mut self,
        asset: &Asset,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), CustodyError> {
        let available = self.balance_of(asset, from);
        if available < amount {
            return Err(CustodyError::InsufficientBalance {
                asset: asset.clone(),
                account: from.clone(),
                requested: amount,
                available,
            });
        }
        if from == to {
            return Ok(());
        }
        let to_balance = self.balance_of(asset, to);
        let credited = to_balance
            .checked_add(amount)
            .ok_or_else(|| CustodyError::Overflow { account: to.clone() })?;
        self.balances
            .insert((asset.clone(), from.clone()), available - amount);
        self.balances.insert((asset.clone(), to.clone()), credited);
        Ok(())
    }
}

impl AssetCustody for InMemoryCustody {
    fn transfer_from(
        &mut self,
        asset: &Asset,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), CustodyError> {
        let allowed = self.allowance(asset, from, to);
        if allowed < amount {
            return Err(CustodyError::InsufficientAllowance {
                asset: asset.clone(),
                owner: from.clone(),
                spender: to.clone(),
                requested: amount,
                allowed,
            });
        }
        self.move_funds(asset, from, to, amount)?;
        self.approve(asset, from, to, allowed - amount);
        Ok(())
    }

    fn transfer(
        &mut self,
        asset: &Asset,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), CustodyError> {
        self.move_funds(asset, from, to, amount)
    }

    fn balance_of(&self, asset: &Asset, account: &AccountId) -> Amount {
        self.balances
            .get(&(asset.clone(), account.clone()))
            .copied()
            .unwrap_or(0)
    }
}

// =============================================================================
// Mock: FailingCustody (test / testing feature)
// =============================================================================

/// Wraps an [`InMemoryCustody`] and rejects outbound transfers on demand.
#[cfg(any(test, feature = "testing"))]
#[derive(Debug, Default, Clone)]
pub struct FailingCustody {
    pub inner: InMemoryCustody,
    /// Whether `transfer` calls should fail.
    pub fail_outbound: bool,
}

#[cfg(any(test, feature = "testing"))]
impl AssetCustody for FailingCustody {
    fn transfer_from(
        &mut self,
        asset: &Asset,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), CustodyError> {
        self.inner.transfer_from(asset, from, to, amount)
    }

    fn transfer(
        &mut self,
        asset: &Asset,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), CustodyError> {
        if self.fail_outbound {
            return Err(CustodyError::Other("mock outbound failure".to_string()));
        }
        self.inner.transfer(asset, from, to, amount)
    }

    fn balance_of(&self, asset: &Asset, account: &AccountId) -> Amount {
        self.inner.balance_of(asset, account)
    }
}
