use soroban_sdk::{contracterror, contracttype, Address};

/// Storage keys for the contract.
#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    /// Admin address.
    Admin,
    /// Token accepted by `lock_tokens`.
    Token,
    /// Native XLM SAC address, recoverable via `withdraw_native`.
    NativeToken,
    /// Sum of unclaimed lockup amounts.
    TotalLocked,
    /// Number of lockups ever created by an owner.
    LockupCount(Address),
    /// One lockup, keyed by owner and index.
    Lockup(Address, u32),
}

/// A single deposit, locked until `unlock_at`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Lockup {
    pub amount: i128,
    pub created_at: u64,
    pub unlock_at: u64,
    pub claimed: bool,
}

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum LockingError {
    /// Deposit or withdrawal amount is not positive.
    InsufficientAmount = 1,
    /// Lockup already claimed or not yet matured.
    NothingToClaim = 2,
    /// No lockup at the requested index.
    IndexOutOfRange = 3,
    /// Caller is not the lockup owner or not the admin.
    Unauthorized = 4,
    /// Withdrawal would dip into tokens backing unclaimed lockups.
    LockedFundsProtected = 5,
    /// Contract does not hold enough of the requested asset.
    InsufficientExternalBalance = 6,
}
