use lockup_ledger::config::LedgerConfig;
use lockup_ledger::scenario::{replay, Scenario};
use lockup_ledger::{AccountId, Asset, LedgerEvent};
use testresult::TestResult;

const ONE: u128 = 1_000_000_000_000_000_000;
const DEMO_CONFIG: &str = include_str!("../../../demos/ledger.toml");
const DEMO_SCENARIO: &str = include_str!("../../../demos/lockup_and_recovery.json");

#[test_log::test]
fn test_demo_scenario_replays() -> TestResult {
    let config = LedgerConfig::from_toml_str(DEMO_CONFIG)?;
    let scenario = Scenario::from_json(DEMO_SCENARIO)?;
    let report = replay(&config, &scenario);

    let failed: Vec<usize> = report
        .outcomes
        .iter()
        .filter(|o| !o.ok)
        .map(|o| o.step)
        .collect();
    // Over-withdrawal, early claim, foreign claim, double claim, ex-admin.
    assert_eq!(failed, vec![9, 12, 14, 16, 19]);
    assert_eq!(report.outcomes[15].amount, Some(50 * ONE));
    assert_eq!(report.outcomes[17].amount, Some(25 * ONE));
    assert_eq!(report.outcomes[5].index, Some(1));
    assert_eq!(report.outcomes[6].index, Some(0));

    assert_eq!(report.locked_total, 10 * ONE);
    assert_eq!(report.events.len(), 5);
    assert!(matches!(
        report.events.last(),
        Some(LedgerEvent::Claimed { index: 1, .. })
    ));

    let bob_lockup = report
        .lockups
        .iter()
        .find(|row| row.owner == AccountId::new("bob"))
        .ok_or("bob has a lockup")?;
    assert!(!bob_lockup.claimed);
    assert_eq!(bob_lockup.unlocks, "2024-06-29T00:00:00+00:00");

    let ledger_ecm: u128 = report
        .ledger_holdings
        .iter()
        .filter(|h| h.asset == Asset::token("ECM"))
        .map(|h| h.amount)
        .sum();
    assert_eq!(ledger_ecm, 10 * ONE);
    Ok(())
}
