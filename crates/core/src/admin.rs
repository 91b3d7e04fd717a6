//! Administrative access control.
//!
//! The ledger only asks one question of its access-control collaborator:
//! is this caller the administrator? [`OwnerGate`] is the single-owner
//! implementation, with ownership hand-over and renouncement.

use crate::error::LedgerError;
use crate::types::AccountId;

/// Predicate gating administrative ledger operations.
pub trait AdminGate {
    fn is_admin(&self, caller: &AccountId) -> bool;
}

/// Single-owner admin gate. An empty owner means the role was renounced and
/// nobody passes the gate anymore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerGate {
    owner: Option<AccountId>,
}

impl OwnerGate {
    pub fn new(owner: AccountId) -> Self {
        Self { owner: Some(owner) }
    }

    pub fn owner(&self) -> Option<&AccountId> {
        self.owner.as_ref()
    }

    /// Transfer the admin role to `new_owner`. Admin-only.
    pub fn transfer(&mut self, caller: &AccountId, new_owner: AccountId) -> Result<(), LedgerError> {
        self.ensure_owner(caller)?;
        tracing::info!(from = %caller, to = %new_owner, "Admin role transferred");
        self.owner = Some(new_owner);
        Ok(())
    }

    /// Leave the admin role empty. Admin-only and irreversible.
    pub fn renounce(&mut self, caller: &AccountId) -> Result<(), LedgerError> {
        self.ensure_owner(caller)?;
        tracing::info!(by = %caller, "Admin role renounced");
        self.owner = None;
        Ok(())
    }

    fn ensure_owner(&self, caller: &AccountId) -> Result<(), LedgerError> {
        if self.is_admin(caller) {
            Ok(())
        } else {
            Err(LedgerError::Unauthorized {
                caller: caller.clone(),
            })
        }
    }
}

impl AdminGate for OwnerGate {
    fn is_admin(&self, caller: &AccountId) -> bool {
        self.owner.as_ref() == Some(caller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_owner_passes() {
        let gate = OwnerGate::new(AccountId::new("admin"));
        assert!(gate.is_admin(&AccountId::new("admin")));
        assert!(!gate.is_admin(&AccountId::new("mallory")));
    }

    #[test]
    fn test_transfer_moves_role() {
        let admin = AccountId::new("admin");
        let next = AccountId::new("next");
        let mut gate = OwnerGate::new(admin.clone());

        gate.transfer(&admin, next.clone()).unwrap();

        assert!(!gate.is_admin(&admin));
        assert!(gate.is_admin(&next));
    }

    #[test]
    fn test_non_owner_cannot_transfer() {
        let mut gate = OwnerGate::new(AccountId::new("admin"));
        let mallory = AccountId::new("mallory");
        let err = gate.transfer(&mallory, mallory.clone()).unwrap_err();
        assert_eq!(err, LedgerError::Unauthorized { caller: mallory });
    }

    #[test]
    fn test_renounce_locks_everyone_out() {
        let admin = AccountId::new("admin");
        let mut gate = OwnerGate::new(admin.clone());
        gate.renounce(&admin).unwrap();
        assert!(gate.owner().is_none());
        assert!(!gate.is_admin(&admin));
        assert!(gate.renounce(&admin).is_err());
    }
}
