//! Ledger configuration.
//!
//! Layers, lowest to highest precedence: built-in defaults, a TOML file,
//! `LOCKUP_*` environment variables, then command-line flags (applied by the
//! binary).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::admin::OwnerGate;
use crate::custody::AssetCustody;
use crate::ledger::Ledger;
use crate::time_source::TimeSource;
use crate::types::{AccountId, TokenId};

/// Token the ledger locks when nothing else is configured.
pub const DEFAULT_CUSTODIED_TOKEN: &str = "0x4C324169890F42c905f3b8f740DBBe7C4E5e55C0";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
}

/// Settings given on the command line. Unset fields leave the lower layers
/// alone; `json_logs` can only switch JSON output on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub ledger_account: Option<String>,
    pub custodied_token: Option<String>,
    pub admin: Option<String>,
    pub log_level: Option<String>,
    pub json_logs: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LedgerConfig {
    /// Account under which the ledger holds funds.
    pub ledger_account: AccountId,
    /// Token locked by deposits.
    pub custodied_token: TokenId,
    /// Initial holder of the admin role.
    pub admin: AccountId,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// Emit logs as JSON lines.
    pub json_logs: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            ledger_account: AccountId::new("locking"),
            custodied_token: TokenId::new(DEFAULT_CUSTODIED_TOKEN),
            admin: AccountId::new("owner"),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl LedgerConfig {
    /// Resolve the effective configuration: defaults, then `file`, then the
    /// `LOCKUP_*` variables from `lookup`, then `overrides`.
    pub fn layered(
        file: Option<&Path>,
        lookup: impl Fn(&str) -> Option<String>,
        overrides: &ConfigOverrides,
    ) -> Result<Self, ConfigError> {
        let mut config = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_vars(lookup)?;
        config.apply_overrides(overrides);
        Ok(config)
    }

    /// [`Self::layered`] against the process environment.
    pub fn load(file: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        Self::layered(file, |key| std::env::var(key).ok(), overrides)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&contents)?;
        tracing::debug!(path = %path.as_ref().display(), "Loaded ledger config");
        Ok(config)
    }


    /// Override fields from an arbitrary variable lookup.
    pub fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(account) = non_empty("LOCKUP_LEDGER_ACCOUNT") {
            self.ledger_account = AccountId::new(account);
        }
        if let Some(token) = non_empty("LOCKUP_CUSTODIED_TOKEN") {
            self.custodied_token = TokenId::new(token);
        }
        if let Some(admin) = non_empty("LOCKUP_ADMIN") {
            self.admin = AccountId::new(admin);
        }
        if let Some(level) = non_empty("LOCKUP_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(json) = non_empty("LOCKUP_JSON_LOGS") {
            self.json_logs = parse_bool(&json).ok_or(ConfigError::InvalidValue {
                key: "LOCKUP_JSON_LOGS",
                value: json,
            })?;
        }
        Ok(())
    }

    /// Apply command-line settings on top of everything else.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(account) = &overrides.ledger_account {
            self.ledger_account = AccountId::new(account.as_str());
        }
        if let Some(token) = &overrides.custodied_token {
            self.custodied_token = TokenId::new(token.as_str());
        }
        if let Some(admin) = &overrides.admin {
            self.admin = AccountId::new(admin.as_str());
        }
        if let Some(level) = &overrides.log_level {
            self.log_level.clone_from(level);
        }
        if overrides.json_logs {
            self.json_logs = true;
        }
    }

    /// Build a ledger owned by the configured admin.
    pub fn build_ledger<C, T>(&self, custody: C, time_source: T) -> Ledger<C, OwnerGate, T>
    where
        C: AssetCustody,
        T: TimeSource,
    {
        Ledger::new(
            self.ledger_account.clone(),
            self.custodied_token.clone(),
            custody,
            OwnerGate::new(self.admin.clone()),
            time_source,
        )
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
