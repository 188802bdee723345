//! On-chain arbitrage executor for Arbitrum One (42161) and Optimism (10).
//!
//! Author: AI-Generated
//! Created: 2026-01-28

pub mod bundle;
pub mod chain;
pub mod config;
pub mod contracts;
pub mod dex;
pub mod domain;
pub mod error;
pub mod gas;
pub mod oracle;
pub mod pathfinder;
pub mod quote;
pub mod report;
pub mod risk;
pub mod scheduler;
pub mod slippage;
pub mod threshold;
pub mod token;

pub use config::{Cli, Config};
pub use error::{CoreError, CoreResult};
