use soroban_sdk::{Address, Env};

use crate::types::{DataKey, Lockup};

/// Bump amount for instance storage (roughly 30 days in ledgers).
pub(crate) const LEDGER_BUMP: u32 = 518_400;
/// Threshold for bumping (roughly 15 days).
pub(crate) const LEDGER_THRESHOLD: u32 = 259_200;

// =============================================================================
// Instance: configuration and totals
// =============================================================================

/// Keep the contract instance, and the configuration stored in it, alive.
pub fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(LEDGER_THRESHOLD, LEDGER_BUMP);
}

pub fn get_admin(env: &Env) -> Address {
    env.storage()
        .instance()
        .get(&DataKey::Admin)
        .expect("admin not set")
}

pub fn set_admin(env: &Env, admin: &Address) {
    env.storage().instance().set(&DataKey::Admin, admin);
}

pub fn get_token(env: &Env) -> Address {
    env.storage()
        .instance()
        .get(&DataKey::Token)
        .expect("token not set")
}

pub fn set_token(env: &Env, token: &Address) {
    env.storage().instance().set(&DataKey::Token, token);
}

pub fn get_native_token(env: &Env) -> Address {
    env.storage()
        .instance()
        .get(&DataKey::NativeToken)
        .expect("native token not set")
}

pub fn set_native_token(env: &Env, token: &Address) {
    env.storage().instance().set(&DataKey::NativeToken, token);
}

pub fn get_total_locked(env: &Env) -> i128 {
    env.storage()
        .instance()
        .get(&DataKey::TotalLocked)
        .unwrap_or(0)
}

pub fn set_total_locked(env: &Env, total: i128) {
    env.storage().instance().set(&DataKey::TotalLocked, &total);
}

// =============================================================================
// Persistent: lockups
// =============================================================================

// Lockup entries must outlive the maturity delay: writes extend them to the
// network maximum and reads top them up.

fn put_lockup_entry<V>(env: &Env, key: &DataKey, value: &V)
where
    V: soroban_sdk::IntoVal<Env, soroban_sdk::Val>,
{
    let max = env.storage().max_ttl();
    env.storage().persistent().set(key, value);
    env.storage().persistent().extend_ttl(key, max, max);
}

fn touch_lockup_entry(env: &Env, key: &DataKey) {
    let max = env.storage().max_ttl();
    env.storage()
        .persistent()
        .extend_ttl(key, LEDGER_THRESHOLD, max);
}

pub fn get_lockup_count(env: &Env, owner: &Address) -> u32 {
    let key = DataKey::LockupCount(owner.clone());
    let count = env.storage().persistent().get(&key);
    if count.is_some() {
        touch_lockup_entry(env, &key);
    }
    count.unwrap_or(0)
}

pub fn get_lockup(env: &Env, owner: &Address, index: u32) -> Option<Lockup> {
    let key = DataKey::Lockup(owner.clone(), index);
    let lockup = env.storage().persistent().get(&key);
    if lockup.is_some() {
        touch_lockup_entry(env, &key);
    }
    lockup
}

pub fn set_lockup(env: &Env, owner: &Address, index: u32, lockup: &Lockup) {
    put_lockup_entry(env, &DataKey::Lockup(owner.clone(), index), lockup);
}

/// Append a lockup at the owner's next index and return that index.
pub fn push_lockup(env: &Env, owner: &Address, lockup: &Lockup) -> u32 {
    let index = get_lockup_count(env, owner);
    set_lockup(env, owner, index, lockup);
    put_lockup_entry(env, &DataKey::LockupCount(owner.clone()), &(index + 1));
    index
}
