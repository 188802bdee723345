//! Configuration: one `Config` struct built from environment variables
//! (loaded via `dotenv`, per the Design Note preferring an explicit struct
//! over ambient globals) with CLI flags layered on top via `clap`'s `env`
//! feature so a flag always wins over its matching environment variable.

use std::time::Duration;

use alloy::primitives::Address;
use clap::Parser;

use crate::error::CoreError;

#[derive(Debug, Clone, Parser)]
#[command(name = "dexarb-executor", about = "On-chain arbitrage executor for Arbitrum One and Optimism")]
pub struct Cli {
    /// Dry-run: build and score opportunities but never submit a transaction.
    #[arg(short = 's', long = "simulate", env = "DEXARB_SIMULATE")]
    pub simulate: bool,

    /// Verbose logging (debug level instead of info).
    #[arg(short = 'v', long = "verbose", env = "DEXARB_VERBOSE")]
    pub verbose: bool,

    /// Enable cross-chain scanning in addition to the default chain.
    #[arg(short = 'c', long = "cross-chain", env = "DEXARB_CROSS_CHAIN")]
    pub cross_chain: bool,

    /// Enable triangular (3+ hop) candidate search, not just direct arbitrage.
    #[arg(short = 't', long = "triangular", env = "DEXARB_TRIANGULAR")]
    pub triangular: bool,

    /// Number of worker tasks.
    #[arg(long = "workers", env = "DEXARB_WORKERS", default_value_t = 4)]
    pub workers: usize,

    /// Stop after this many seconds (0 = run until a shutdown signal).
    #[arg(long = "duration", env = "DEXARB_DURATION_SECS", default_value_t = 0)]
    pub duration_secs: u64,

    /// Minimum profit in USD before an opportunity is even quoted further.
    #[arg(long = "min-profit", env = "DEXARB_MIN_PROFIT_USD", default_value_t = 2.0)]
    pub min_profit_usd: f64,

    #[arg(long = "scan-interval", env = "DEXARB_SCAN_INTERVAL_MS", default_value_t = 2000)]
    pub scan_interval_ms: u64,

    #[arg(long = "report-interval", env = "DEXARB_REPORT_INTERVAL_MS", default_value_t = 3_600_000)]
    pub report_interval_ms: u64,
}

pub const EXIT_OK: i32 = 0;
pub const EXIT_CONFIG_ERROR: i32 = 1;
pub const EXIT_RUNTIME_ERROR: i32 = 2;

#[derive(Debug, Clone)]
pub struct Config {
    pub chain_id: u64,
    pub rpc_url: String,
    pub relay_url: Option<String>,
    pub private_key: String,
    pub executor_address: Address,
    pub flash_loan_vault_address: Option<Address>,
    pub quoter_v2_address: Address,
    pub report_dir: String,
    pub simulate: bool,
    pub cross_chain: bool,
    pub triangular: bool,
    pub workers: usize,
    pub duration: Option<Duration>,
    pub min_profit_usd: f64,
    pub scan_interval: Duration,
    pub report_interval: Duration,
}

impl Config {
    /// Loads `.env` (if present) then layers CLI/env flags over the
    /// per-chain environment variables (`RPC_URL_<chain_id>`, etc.).
    pub fn load(cli: Cli, chain_id: u64) -> Result<Self, CoreError> {
        dotenv::dotenv().ok();

        let rpc_url = env_var(&format!("RPC_URL_{chain_id}")).or_else(|_| env_var("RPC_URL"))?;
        let relay_url = env_var(&format!("RELAY_URL_{chain_id}")).ok();
        let private_key = env_var("PRIVATE_KEY")?;
        let executor_address = parse_address(&env_var(&format!("EXECUTOR_ADDRESS_{chain_id}"))?)?;
        let flash_loan_vault_address = env_var(&format!("FLASH_LOAN_VAULT_ADDRESS_{chain_id}"))
            .ok()
            .map(|s| parse_address(&s))
            .transpose()?;
        let quoter_v2_address = parse_address(&env_var(&format!("QUOTER_V2_ADDRESS_{chain_id}"))?)?;
        let report_dir = env_var("REPORT_DIR").unwrap_or_else(|_| "./reports".to_string());

        Ok(Self {
            chain_id,
            rpc_url,
            relay_url,
            private_key,
            executor_address,
            flash_loan_vault_address,
            quoter_v2_address,
            report_dir,
            simulate: cli.simulate,
            cross_chain: cli.cross_chain,
            triangular: cli.triangular,
            workers: cli.workers.max(1),
            duration: if cli.duration_secs == 0 {
                None
            } else {
                Some(Duration::from_secs(cli.duration_secs))
            },
            min_profit_usd: cli.min_profit_usd,
            scan_interval: Duration::from_millis(cli.scan_interval_ms),
            report_interval: Duration::from_millis(cli.report_interval_ms),
        })
    }
}

fn env_var(key: &str) -> Result<String, CoreError> {
    std::env::var(key).map_err(|_| CoreError::ConfigInvalid(format!("missing environment variable {key}")))
}

fn parse_address(raw: &str) -> Result<Address, CoreError> {
    raw.parse()
        .map_err(|e| CoreError::ConfigInvalid(format!("invalid address {raw}: {e}")))
}
