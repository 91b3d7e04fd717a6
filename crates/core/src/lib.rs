//! Token time-lock ledger.
//!
//! Depositors lock a fungible token for a fixed [`MATURITY_DELAY`]; once a
//! lockup matures its owner may claim the original amount back, exactly once.
//! An administrator may recover anything the ledger holds by mistake, but
//! never the tokens backing unclaimed lockups.
//!
//! The ledger talks to the outside world through three narrow seams:
//! [`AssetCustody`] moves funds, [`AdminGate`] answers "is this the admin?",
//! and [`TimeSource`] tells the time. Wrap a [`Ledger`] in a [`SharedLedger`]
//! to use it from several threads.

pub mod admin;
pub mod config;
pub mod custody;
pub mod error;
pub mod events;
pub mod ledger;
pub mod lockup;
pub mod logging;
pub mod scenario;
pub mod shared;
pub mod time_source;
pub mod types;

pub use admin::{AdminGate, OwnerGate};
pub use config::{ConfigOverrides, LedgerConfig};
pub use custody::{AssetCustody, CustodyError, InMemoryCustody};
pub use error::LedgerError;
pub use events::LedgerEvent;
pub use ledger::Ledger;
pub use lockup::{Lockup, LockupBook, LockupInfo, LockupSnapshot, MATURITY_DELAY};
pub use shared::SharedLedger;
pub use time_source::{SharedMockTimeSource, SystemTimeSource, TimeSource};
pub use types::{AccountId, Amount, Asset, Timestamp, TokenId};

#[cfg(feature = "testing")]
pub use custody::FailingCustody;
