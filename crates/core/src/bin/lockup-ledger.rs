use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use lockup_ledger::config::{ConfigOverrides, LedgerConfig};
use lockup_ledger::logging::init_tracing;
use lockup_ledger::scenario::{replay, Scenario};

/// Token time-lock ledger simulator.
#[derive(Parser, Debug)]
#[command(name = "lockup-ledger", version, about)]
struct Cli {
    /// TOML configuration file.
    #[arg(long, env = "LOCKUP_CONFIG", global = true)]
    config: Option<PathBuf>,
    /// Initial admin account.
    #[arg(long, global = true)]
    admin: Option<String>,
    /// Token locked by deposits.
    #[arg(long, global = true)]
    custodied_token: Option<String>,
    /// Account under which the ledger holds funds.
    #[arg(long, global = true)]
    ledger_account: Option<String>,
    /// Default log filter when RUST_LOG is unset.
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a JSON scenario and print the resulting report.
    Run {
        /// Scenario file.
        #[arg(long)]
        scenario: PathBuf,
        /// Pretty-print the report.
        #[arg(long)]
        pretty: bool,
        /// Exit with an error if any step failed.
        #[arg(long)]
        strict: bool,
    },
    /// Print the effective configuration as TOML.
    ShowConfig,
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<LedgerConfig> {
        let overrides = ConfigOverrides {
            ledger_account: self.ledger_account.clone(),
            custodied_token: self.custodied_token.clone(),
            admin: self.admin.clone(),
            log_level: self.log_level.clone(),
            json_logs: self.json_logs,
        };
        let config = LedgerConfig::load(self.config.as_deref(), &overrides);
        match &self.config {
            Some(path) => config.with_context(|| format!("loading config from {}", path.display())),
            None => config.context("reading LOCKUP_* environment"),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;
    init_tracing(&config);

    match cli.command {
        Command::Run {
            scenario,
            pretty,
            strict,
        } => {
            let raw = std::fs::read_to_string(&scenario)
                .with_context(|| format!("reading scenario {}", scenario.display()))?;
            let parsed = Scenario::from_json(&raw)
                .with_context(|| format!("parsing scenario {}", scenario.display()))?;

            tracing::info!(
                steps = parsed.steps.len(),
                custodied_token = %config.custodied_token,
                admin = %config.admin,
                "Replaying scenario"
            );
            let report = replay(&config, &parsed);

            let out = if pretty {
                serde_json::to_string_pretty(&report)?
            } else {
                serde_json::to_string(&report)?
            };
            println!("{out}");

            let failures = report.failures();
            if strict && failures > 0 {
                bail!("{failures} scenario step(s) failed");
            }
        }
        Command::ShowConfig => {
            println!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
