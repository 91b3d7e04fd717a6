//! Scripted replays against an in-memory ledger.
//!
//! A scenario is a JSON document listing steps: funding accounts, approving
//! the ledger, depositing, moving the clock, claiming and administrative
//! recovery. Each step runs against a fresh [`InMemoryCustody`] and a
//! manually driven clock; failing steps are recorded and the replay goes on.
//!
//! ```json
//! { "steps": [
//!     { "mint": { "asset": { "token": "ECM" }, "to": "alice", "amount": 100 } },
//!     { "approve": { "owner": "alice", "amount": 100 } },
//!     { "deposit": { "account": "alice", "amount": 50 } },
//!     { "advance": { "seconds": 15552000 } },
//!     { "claim": { "account": "alice", "index": 0 } }
//! ] }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::admin::OwnerGate;
use crate::config::LedgerConfig;
use crate::custody::{AssetCustody, InMemoryCustody};
use crate::error::LedgerError;
use crate::events::LedgerEvent;
use crate::ledger::Ledger;
use crate::time_source::SharedMockTimeSource;
use crate::types::{AccountId, Amount, Asset, Timestamp};

/// Clock start used when a scenario does not pick one (2024-01-01T00:00:00Z).
pub const DEFAULT_START_TIME: Timestamp = 1_704_067_200;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub start_time: Option<Timestamp>,
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Create funds out of thin air.
    Mint {
        asset: Asset,
        to: AccountId,
        amount: Amount,
    },
    /// Let the ledger pull up to `amount` of the custodied token from `owner`.
    Approve { owner: AccountId, amount: Amount },
    /// Plain transfer outside the ledger, e.g. funds sent to it by mistake.
    Send {
        asset: Asset,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    },
    Deposit { account: AccountId, amount: Amount },
    Claim { account: AccountId, index: usize },
    ClaimFor {
        caller: AccountId,
        owner: AccountId,
        index: usize,
    },
    Advance { seconds: u64 },
    WithdrawCustodied { caller: AccountId, amount: Amount },
    WithdrawOther {
        caller: AccountId,
        asset: Asset,
        amount: Amount,
    },
    WithdrawNative { caller: AccountId, amount: Amount },
    TransferAdmin { caller: AccountId, new_admin: AccountId },
}

impl Step {
    fn accounts(&self) -> Vec<&AccountId> {
        match self {
            Step::Mint { to, .. } => vec![to],
            Step::Approve { owner, .. } => vec![owner],
            Step::Send { from, to, .. } => vec![from, to],
            Step::Deposit { account, .. } | Step::Claim { account, .. } => vec![account],
            Step::ClaimFor { caller, owner, .. } => vec![caller, owner],
            Step::Advance { .. } => vec![],
            Step::WithdrawCustodied { caller, .. }
            | Step::WithdrawOther { caller, .. }
            | Step::WithdrawNative { caller, .. } => vec![caller],
            Step::TransferAdmin { caller, new_admin } => vec![caller, new_admin],
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StepOutcome {
    pub step: usize,
    pub ok: bool,
    /// Index of the lockup a deposit created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    /// Amount a claim paid out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LockupRow {
    pub owner: AccountId,
    pub index: usize,
    pub amount: Amount,
    pub created_at: Timestamp,
    pub unlock_at: Timestamp,
    /// `unlock_at` as RFC 3339, for humans.
    pub unlocks: String,
    pub claimed: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Holding {
    pub asset: Asset,
    pub amount: Amount,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Report {
    pub outcomes: Vec<StepOutcome>,
    pub events: Vec<LedgerEvent>,
    pub lockups: Vec<LockupRow>,
    pub locked_total: Amount,
    pub ledger_holdings: Vec<Holding>,
    pub balances: BTreeMap<AccountId, Vec<Holding>>,
}

impl Report {
    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.ok).count()
    }
}

type SimLedger = Ledger<InMemoryCustody, OwnerGate, SharedMockTimeSource>;

/// Run every step of `scenario` against a fresh ledger built from `config`.
pub fn replay(config: &LedgerConfig, scenario: &Scenario) -> Report {
    let clock = SharedMockTimeSource::starting_at(scenario.start_time.unwrap_or(DEFAULT_START_TIME));
    let mut ledger = config.build_ledger(InMemoryCustody::new(), clock.clone());
    let mut accounts = BTreeSet::new();

    let mut outcomes = Vec::with_capacity(scenario.steps.len());
    for (step_no, step) in scenario.steps.iter().enumerate() {
        let _span = tracing::info_span!("step", step = step_no).entered();
        accounts.extend(step.accounts().into_iter().cloned());

        let outcome = match run_step(&mut ledger, &clock, step) {
            Ok(produced) => StepOutcome {
                step: step_no,
                ok: true,
                index: produced.index,
                amount: produced.amount,
                error: None,
            },
            Err(e) => {
                tracing::info!(error = %e, "Step failed");
                StepOutcome {
                    step: step_no,
                    ok: false,
                    index: None,
                    amount: None,
                    error: Some(e.to_string()),
                }
            }
        };
        outcomes.push(outcome);
    }

    accounts.remove(ledger.account());
    build_report(&mut ledger, outcomes, accounts)
}

/// What a successful step hands back to the report.
#[derive(Debug, Default)]
struct Produced {
    index: Option<usize>,
    amount: Option<Amount>,
}

fn run_step(
    ledger: &mut SimLedger,
    clock: &SharedMockTimeSource,
    step: &Step,
) -> Result<Produced, LedgerError> {
    match step {
        Step::Mint { asset, to, amount } => {
            ledger.custody_mut().mint(asset, to, *amount)?;
            Ok(Produced::default())
        }
        Step::Approve { owner, amount } => {
            let asset = ledger.custodied_asset().clone();
            let spender = ledger.account().clone();
            ledger.custody_mut().approve(&asset, owner, &spender, *amount);
            Ok(Produced::default())
        }
        Step::Send {
            asset,
            from,
            to,
            amount,
        } => {
            ledger.custody_mut().transfer(asset, from, to, *amount)?;
            Ok(Produced::default())
        }
        Step::Deposit { account, amount } => {
            let index = ledger.deposit(account, *amount)?;
            Ok(Produced {
                index: Some(index),
                amount: None,
            })
        }
        Step::Claim { account, index } => ledger.claim(account, *index).map(paid),
        Step::ClaimFor {
            caller,
            owner,
            index,
        } => ledger.claim_for(caller, owner, *index).map(paid),
        Step::Advance { seconds } => {
            clock.advance(Duration::from_secs(*seconds));
            Ok(Produced::default())
        }
        Step::WithdrawCustodied { caller, amount } => {
            ledger.withdraw_custodied_asset(caller, *amount)?;
            Ok(Produced::default())
        }
        Step::WithdrawOther {
            caller,
            asset,
            amount,
        } => {
            ledger.withdraw_other_asset(caller, asset, *amount)?;
            Ok(Produced::default())
        }
        Step::WithdrawNative { caller, amount } => {
            ledger.withdraw_native(caller, *amount)?;
            Ok(Produced::default())
        }
        Step::TransferAdmin { caller, new_admin } => {
            ledger.transfer_admin(caller, new_admin.clone())?;
            Ok(Produced::default())
        }
    }
}

fn paid(amount: Amount) -> Produced {
    Produced {
        index: None,
        amount: Some(amount),
    }
}

fn build_report(
    ledger: &mut SimLedger,
    outcomes: Vec<StepOutcome>,
    accounts: BTreeSet<AccountId>,
) -> Report {
    let mut lockups = Vec::new();
    for owner in ledger.book().owners() {
        for (index, lockup) in ledger.lockups(owner).iter().enumerate() {
            lockups.push(LockupRow {
                owner: owner.clone(),
                index,
                amount: lockup.amount,
                created_at: lockup.created_at,
                unlock_at: lockup.unlock_at,
                unlocks: format_timestamp(lockup.unlock_at),
                claimed: lockup.claimed,
            });
        }
    }

    let holdings = |account: &AccountId| -> Vec<Holding> {
        ledger
            .custody()
            .holdings(account)
            .into_iter()
            .map(|(asset, amount)| Holding { asset, amount })
            .collect()
    };
    let ledger_holdings = holdings(ledger.account());
    let balances = accounts
        .into_iter()
        .map(|account| {
            let held = holdings(&account);
            (account, held)
        })
        .collect();

    Report {
        outcomes,
        events: ledger.take_events(),
        lockups,
        locked_total: ledger.locked_total(),
        ledger_holdings,
        balances,
    }
}

fn format_timestamp(ts: Timestamp) -> String {
    i64::try_from(ts)
        .ok()
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| ts.to_string())
}
