#![no_std]

mod storage;
mod types;


use soroban_sdk::{contract, contractimpl, symbol_short, token, Address, Env};

pub use types::{Lockup, LockingError};

/// Seconds between a deposit and its maturity (180 days).
pub const MATURITY_DELAY: u64 = 15_552_000;

#[contract]
pub struct TokenLocking;

#[contractimpl]
impl TokenLocking {
    /// Initialize with an admin, the token to lock, and the native XLM SAC.
    pub fn __constructor(env: Env, admin: Address, token: Address, native_token: Address) {
        storage::set_admin(&env, &admin);
        storage::set_token(&env, &token);
        storage::set_native_token(&env, &native_token);
        storage::set_total_locked(&env, 0);
        storage::bump_instance(&env);
    }

    /// Lock `amount` of the token for [`MATURITY_DELAY`] seconds.
    ///
    /// Returns the index of the new lockup within the caller's sequence.
    pub fn lock_tokens(env: Env, caller: Address, amount: i128) -> Result<u32, LockingError> {
        caller.require_auth();
        storage::bump_instance(&env);
        if amount <= 0 {
            return Err(LockingError::InsufficientAmount);
        }

        let token_client = token::Client::new(&env, &storage::get_token(&env));
        token_client.transfer(&caller, &env.current_contract_address(), &amount);

        let now = env.ledger().timestamp();
        let lockup = Lockup {
            amount,
            created_at: now,
            unlock_at: now.saturating_add(MATURITY_DELAY),
            claimed: false,
        };
        let index = storage::push_lockup(&env, &caller, &lockup);
        storage::set_total_locked(&env, storage::get_total_locked(&env) + amount);

        env.events()
            .publish((symbol_short!("LOCKED"), caller), (index, amount));

        Ok(index)
    }

    /// Claim the caller's matured lockup at `index`. Returns the amount paid.
    pub fn claim(env: Env, caller: Address, index: u32) -> Result<i128, LockingError> {
        caller.require_auth();
        storage::bump_instance(&env);

        let mut lockup =
            storage::get_lockup(&env, &caller, index).ok_or(LockingError::IndexOutOfRange)?;
        if lockup.claimed || env.ledger().timestamp() < lockup.unlock_at {
            return Err(LockingError::NothingToClaim);
        }

        lockup.claimed = true;
        storage::set_lockup(&env, &caller, index, &lockup);
        storage::set_total_locked(&env, storage::get_total_locked(&env) - lockup.amount);

        let token_client = token::Client::new(&env, &storage::get_token(&env));
        token_client.transfer(&env.current_contract_address(), &caller, &lockup.amount);

        env.events()
            .publish((symbol_short!("CLAIMED"), caller), (index, lockup.amount));

        Ok(lockup.amount)
    }

    pub fn get_lockup_count(env: Env, owner: Address) -> u32 {
        storage::bump_instance(&env);
        storage::get_lockup_count(&env, &owner)
    }

    pub fn get_lockup(env: Env, owner: Address, index: u32) -> Result<Lockup, LockingError> {
        storage::bump_instance(&env);
        storage::get_lockup(&env, &owner, index).ok_or(LockingError::IndexOutOfRange)
    }

    /// Sum of all unclaimed lockups.
    pub fn locked_total(env: Env) -> i128 {
        storage::bump_instance(&env);
        storage::get_total_locked(&env)
    }

    /// Recover `amount` of any token held by the contract. Admin-only.
    ///
    /// For the locked token only the balance above [`Self::locked_total`]
    /// can be withdrawn.
    pub fn withdraw_token(
        env: Env,
        caller: Address,
        token: Address,
        amount: i128,
    ) -> Result<(), LockingError> {
        require_admin(&env, &caller)?;
        if amount <= 0 {
            return Err(LockingError::InsufficientAmount);
        }

        let token_client = token::Client::new(&env, &token);
        let held = token_client.balance(&env.current_contract_address());
        if token == storage::get_token(&env) {
            let surplus = held - storage::get_total_locked(&env);
            if amount > surplus {
                return Err(LockingError::LockedFundsProtected);
            }
        } else if amount > held {
            return Err(LockingError::InsufficientExternalBalance);
        }

        token_client.transfer(&env.current_contract_address(), &caller, &amount);
        Ok(())
    }

    /// Recover native XLM held by the contract. Admin-only.
    pub fn withdraw_native(env: Env, caller: Address, amount: i128) -> Result<(), LockingError> {
        let native = storage::get_native_token(&env);
        Self::withdraw_token(env, caller, native, amount)
    }

    /// Transfer admin to a new address. Admin-only.
    pub fn set_admin(env: Env, caller: Address, new_admin: Address) -> Result<(), LockingError> {
        require_admin(&env, &caller)?;
        storage::set_admin(&env, &new_admin);
        Ok(())
    }
}

fn require_admin(env: &Env, caller: &Address) -> Result<(), LockingError> {
    caller.require_auth();
    storage::bump_instance(env);
    if *caller != storage::get_admin(env) {
        return Err(LockingError::Unauthorized);
    }
    Ok(())
}
