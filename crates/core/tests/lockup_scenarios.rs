//! End-to-end lockup flows through the public API.

use std::time::Duration;

use lockup_ledger::{
    AccountId, Amount, Asset, AssetCustody, InMemoryCustody, Ledger, LedgerError, LedgerEvent,
    OwnerGate, SharedMockTimeSource, TokenId, MATURITY_DELAY,
};
use rstest::{fixture, rstest};
use testresult::TestResult;

const ONE: Amount = 1_000_000_000_000_000_000;
const SIX_MONTHS: Duration = Duration::from_secs(15_552_000);

struct Env {
    ledger: Ledger<InMemoryCustody, OwnerGate, SharedMockTimeSource>,
    clock: SharedMockTimeSource,
    owner: AccountId,
    addr1: AccountId,
    addr2: AccountId,
}

impl Env {
    fn token() -> Asset {
        Asset::token("TT")
    }

    fn vault() -> AccountId {
        AccountId::new("locking")
    }

    /// Give `who` tokens from the owner's supply and approve the ledger.
    fn fund_and_approve(&mut self, who: &AccountId, amount: Amount) -> TestResult {
        let bank = self.ledger.custody_mut();
        bank.transfer(&Self::token(), &self.owner, who, amount)?;
        bank.approve(&Self::token(), who, &Self::vault(), amount);
        Ok(())
    }

    fn balance(&self, who: &AccountId) -> Amount {
        self.ledger.custody().balance_of(&Self::token(), who)
    }
}

#[fixture]
fn env() -> Env {
    let clock = SharedMockTimeSource::new();
    let owner = AccountId::new("owner");
    let mut bank = InMemoryCustody::new();
    bank.mint(&Env::token(), &owner, 1_000_000 * ONE)
        .expect("mint total supply");
    let ledger = Ledger::new(
        Env::vault(),
        TokenId::new("TT"),
        bank,
        OwnerGate::new(owner.clone()),
        clock.clone(),
    );
    Env {
        ledger,
        clock,
        owner,
        addr1: AccountId::new("addr1"),
        addr2: AccountId::new("addr2"),
    }
}

#[test]
fn test_maturity_delay_is_six_months() {
    assert_eq!(MATURITY_DELAY, SIX_MONTHS);
}

#[rstest]
#[test_log::test]
fn test_lock_and_claim_after_six_months(mut env: Env) -> TestResult {
    let addr1 = env.addr1.clone();
    env.fund_and_approve(&addr1, 100 * ONE)?;

    env.ledger.deposit(&addr1, 50 * ONE)?;
    let lockup = env.ledger.lockup(&addr1, 0)?;
    assert_eq!(lockup.amount, 50 * ONE);
    assert!(!lockup.claimed);

    env.clock.advance(SIX_MONTHS);
    env.ledger.claim(&addr1, 0)?;

    assert_eq!(
        env.ledger.events().last(),
        Some(&LedgerEvent::Claimed {
            owner: addr1.clone(),
            index: 0,
            amount: 50 * ONE
        })
    );
    assert!(env.ledger.lockup(&addr1, 0)?.claimed);
    assert_eq!(env.balance(&addr1), 100 * ONE);
    Ok(())
}

#[rstest]
fn test_multiple_lockups_claim_each_independently(mut env: Env) -> TestResult {
    let addr1 = env.addr1.clone();
    env.fund_and_approve(&addr1, 200 * ONE)?;
    env.ledger.deposit(&addr1, 50 * ONE)?;
    env.ledger.deposit(&addr1, 75 * ONE)?;
    assert_eq!(env.ledger.lockup_count(&addr1), 2);

    env.clock.advance(SIX_MONTHS);
    assert_eq!(env.ledger.claim(&addr1, 0)?, 50 * ONE);
    assert_eq!(env.ledger.claim(&addr1, 1)?, 75 * ONE);

    assert!(env.ledger.lockup(&addr1, 0)?.claimed);
    assert!(env.ledger.lockup(&addr1, 1)?.claimed);
    assert_eq!(env.balance(&addr1), 200 * ONE);
    Ok(())
}

#[rstest]
#[case::at_deposit(Duration::ZERO)]
#[case::one_day_in(Duration::from_secs(86_400))]
#[case::one_second_short(SIX_MONTHS - Duration::from_secs(1))]
fn test_claim_before_unlock_is_nothing_to_claim(mut env: Env, #[case] elapsed: Duration) -> TestResult {
    let addr1 = env.addr1.clone();
    env.fund_and_approve(&addr1, 100 * ONE)?;
    env.ledger.deposit(&addr1, 50 * ONE)?;

    env.clock.advance(elapsed);
    assert!(matches!(
        env.ledger.claim(&addr1, 0),
        Err(LedgerError::NothingToClaim { .. })
    ));
    assert!(!env.ledger.lockup(&addr1, 0)?.claimed);
    assert_eq!(env.balance(&addr1), 50 * ONE);
    Ok(())
}

#[rstest]
fn test_zero_lock_rejected(mut env: Env) -> TestResult {
    let addr1 = env.addr1.clone();
    env.fund_and_approve(&addr1, 100 * ONE)?;
    assert_eq!(
        env.ledger.deposit(&addr1, 0),
        Err(LedgerError::InsufficientAmount)
    );
    assert_eq!(env.ledger.lockup_count(&addr1), 0);
    Ok(())
}

#[rstest]
fn test_lockup_count_and_info(mut env: Env) -> TestResult {
    let addr1 = env.addr1.clone();
    env.fund_and_approve(&addr1, 100 * ONE)?;
    env.ledger.deposit(&addr1, 10 * ONE)?;
    env.ledger.deposit(&addr1, 20 * ONE)?;

    assert_eq!(env.ledger.lockup_count(&addr1), 2);
    assert_eq!(env.ledger.lockup(&addr1, 0)?.amount, 10 * ONE);
    assert_eq!(env.ledger.lockup(&addr1, 1)?.amount, 20 * ONE);
    assert_eq!(env.ledger.lockup_count(&env.addr2), 0);
    assert!(matches!(
        env.ledger.lockup(&addr1, 2),
        Err(LedgerError::IndexOutOfRange { index: 2, len: 2, .. })
    ));
    Ok(())
}

#[rstest]
fn test_only_lockup_owner_can_claim(mut env: Env) -> TestResult {
    let (addr1, addr2) = (env.addr1.clone(), env.addr2.clone());
    env.fund_and_approve(&addr1, 100 * ONE)?;
    env.ledger.deposit(&addr1, 50 * ONE)?;
    env.clock.advance(SIX_MONTHS);

    assert_eq!(
        env.ledger.claim_for(&addr2, &addr1, 0),
        Err(LedgerError::Unauthorized {
            caller: addr2.clone()
        })
    );
    assert!(env.ledger.claim(&addr2, 0).is_err());
    assert_eq!(env.ledger.claim(&addr1, 0)?, 50 * ONE);
    assert_eq!(env.balance(&addr2), 0);
    Ok(())
}

#[rstest]
fn test_double_claim_reverts(mut env: Env) -> TestResult {
    let addr1 = env.addr1.clone();
    env.fund_and_approve(&addr1, 100 * ONE)?;
    env.ledger.deposit(&addr1, 50 * ONE)?;
    env.clock.advance(SIX_MONTHS);

    env.ledger.claim(&addr1, 0)?;
    assert!(matches!(
        env.ledger.claim(&addr1, 0),
        Err(LedgerError::NothingToClaim { .. })
    ));
    env.clock.advance(SIX_MONTHS * 10);
    assert!(env.ledger.claim(&addr1, 0).is_err());
    assert_eq!(env.balance(&addr1), 100 * ONE);
    Ok(())
}

#[rstest]
fn test_invalid_index_claim_reverts(mut env: Env) -> TestResult {
    let addr1 = env.addr1.clone();
    env.fund_and_approve(&addr1, 100 * ONE)?;
    env.ledger.deposit(&addr1, 50 * ONE)?;
    env.clock.advance(SIX_MONTHS);

    assert!(matches!(
        env.ledger.claim(&addr1, 1),
        Err(LedgerError::IndexOutOfRange { index: 1, .. })
    ));
    Ok(())
}

#[rstest]
fn test_lock_without_approval_reverts(mut env: Env) -> TestResult {
    let addr1 = env.addr1.clone();
    let owner = env.owner.clone();
    env.ledger
        .custody_mut()
        .transfer(&Env::token(), &owner, &addr1, 100 * ONE)?;

    assert!(matches!(
        env.ledger.deposit(&addr1, 50 * ONE),
        Err(LedgerError::Custody(_))
    ));
    assert_eq!(env.ledger.lockup_count(&addr1), 0);
    assert_eq!(env.balance(&addr1), 100 * ONE);
    Ok(())
}

#[rstest]
fn test_lock_with_insufficient_balance_reverts(mut env: Env) {
    let addr1 = env.addr1.clone();
    env.ledger
        .custody_mut()
        .approve(&Env::token(), &addr1, &Env::vault(), 100 * ONE);

    assert!(matches!(
        env.ledger.deposit(&addr1, 50 * ONE),
        Err(LedgerError::Custody(_))
    ));
    assert_eq!(env.ledger.lockup_count(&addr1), 0);
}

#[rstest]
fn test_lock_again_after_claiming_everything(mut env: Env) -> TestResult {
    let addr1 = env.addr1.clone();
    env.fund_and_approve(&addr1, 100 * ONE)?;
    env.ledger.deposit(&addr1, 50 * ONE)?;
    env.clock.advance(SIX_MONTHS);
    env.ledger.claim(&addr1, 0)?;

    assert_eq!(env.ledger.deposit(&addr1, 25 * ONE)?, 1);
    assert_eq!(env.ledger.lockup_count(&addr1), 2);
    let lockup = env.ledger.lockup(&addr1, 1)?;
    assert_eq!(lockup.amount, 25 * ONE);
    assert!(!lockup.claimed);
    Ok(())
}

#[rstest]
fn test_lockup_info_unchanged_by_claim(mut env: Env) -> TestResult {
    let addr1 = env.addr1.clone();
    env.fund_and_approve(&addr1, 100 * ONE)?;
    env.ledger.deposit(&addr1, 50 * ONE)?;
    let before = env.ledger.lockup(&addr1, 0)?;
    env.clock.advance(SIX_MONTHS);
    env.ledger.claim(&addr1, 0)?;

    let after = env.ledger.lockup(&addr1, 0)?;
    assert_eq!(after.amount, before.amount);
    assert_eq!(after.created_at, before.created_at);
    assert_eq!(after.unlock_at, before.unlock_at);
    assert!(after.claimed);
    assert_eq!(env.ledger.lockup_count(&addr1), 1);
    Ok(())
}

#[rstest]
fn test_owner_withdraws_mistaken_other_token(mut env: Env) -> TestResult {
    let owner = env.owner.clone();
    let other = Asset::token("OT");
    let bank = env.ledger.custody_mut();
    bank.mint(&other, &owner, 1_000 * ONE)?;
    bank.transfer(&other, &owner, &Env::vault(), 100 * ONE)?;

    let before = env.ledger.custody().balance_of(&other, &owner);
    env.ledger.withdraw_other_asset(&owner, &other, 50 * ONE)?;
    let after = env.ledger.custody().balance_of(&other, &owner);
    assert_eq!(after - before, 50 * ONE);
    Ok(())
}

#[rstest]
fn test_owner_cannot_withdraw_locked_tokens(mut env: Env) -> TestResult {
    let (owner, addr1) = (env.owner.clone(), env.addr1.clone());
    env.fund_and_approve(&addr1, 10 * ONE)?;
    env.ledger.deposit(&addr1, 10 * ONE)?;

    assert!(matches!(
        env.ledger.withdraw_custodied_asset(&owner, 10 * ONE),
        Err(LedgerError::LockedFundsProtected { .. })
    ));

    env.clock.advance(SIX_MONTHS);
    env.ledger.claim(&addr1, 0)?;
    // A stray direct transfer is surplus and may be recovered.
    env.ledger
        .custody_mut()
        .transfer(&Env::token(), &owner, &Env::vault(), 10 * ONE)?;
    env.ledger.withdraw_custodied_asset(&owner, 10 * ONE)?;
    assert_eq!(env.balance(&Env::vault()), 0);
    Ok(())
}

#[rstest]
fn test_non_owner_cannot_withdraw(mut env: Env) -> TestResult {
    let addr1 = env.addr1.clone();
    let other = Asset::token("OT");
    env.ledger
        .custody_mut()
        .mint(&other, &Env::vault(), 100 * ONE)?;
    env.ledger
        .custody_mut()
        .mint(&Asset::Native, &Env::vault(), ONE / 100)?;

    assert!(matches!(
        env.ledger.withdraw_other_asset(&addr1, &other, 10 * ONE),
        Err(LedgerError::Unauthorized { .. })
    ));
    assert!(matches!(
        env.ledger.withdraw_native(&addr1, ONE / 100),
        Err(LedgerError::Unauthorized { .. })
    ));
    Ok(())
}

#[rstest]
fn test_owner_withdraws_native(mut env: Env) -> TestResult {
    let owner = env.owner.clone();
    env.ledger
        .custody_mut()
        .mint(&Asset::Native, &Env::vault(), ONE / 50)?;

    env.ledger.withdraw_native(&owner, ONE / 100)?;
    assert_eq!(
        env.ledger.custody().balance_of(&Asset::Native, &owner),
        ONE / 100
    );
    assert_eq!(
        env.ledger.custody().balance_of(&Asset::Native, &Env::vault()),
        ONE / 100
    );
    Ok(())
}

#[rstest]
fn test_withdraw_native_insufficient_balance(mut env: Env) {
    let owner = env.owner.clone();
    assert!(matches!(
        env.ledger.withdraw_native(&owner, ONE),
        Err(LedgerError::InsufficientExternalBalance {
            asset: Asset::Native,
            ..
        })
    ));
}
