//! Tagged error taxonomy for the core engine.
//!
//! Every fallible operation in `dexarb-executor` returns `Result<T, CoreError>`
//! (or a `Result<T, anyhow::Error>` at the glue layer, per the crate's
//! convention of `thiserror` for library code and `anyhow` at the binary
//! boundary).

use alloy::primitives::Address;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("network unavailable for chain {chain_id}: {source}")]
    NetworkUnavailable {
        chain_id: u64,
        #[source]
        source: anyhow::Error,
    },

    #[error("invalid RPC response decoding {call}: {detail}")]
    InvalidResponse { call: String, detail: String },

    #[error("chain id mismatch: expected {expected}, provider reported {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    #[error("no pool exists for {token_a}/{token_b} on router {router}")]
    NoPool {
        token_a: Address,
        token_b: Address,
        router: Address,
    },

    #[error("operation timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    #[error("contract call reverted: {reason}")]
    RevertOther { reason: String },

    #[error("simulation reverted: {reason}")]
    SimulationReverted { reason: String },

    #[error("relay submission failed ({kind})")]
    RelaySubmissionFailed { kind: String },

    #[error("risk manager rejected trade: {}", .reasons.join(", "))]
    RiskRejected { reasons: Vec<String> },

    #[error("price validation rejected trade: {}", .reasons.join(", "))]
    PriceRejected { reasons: Vec<String> },

    #[error("opportunity did not clear the profit threshold")]
    ThresholdNotMet,

    #[error("circuit breaker is tripped, refusing execution")]
    CircuitBreakerTripped,

    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("wallet {wallet} is not authorized to execute on chain {chain_id}")]
    WalletUnauthorized { wallet: Address, chain_id: u64 },

    #[error("expected contract at {address} on chain {chain_id} but found no code")]
    ContractNotDeployed { address: Address, chain_id: u64 },
}

pub type CoreResult<T> = Result<T, CoreError>;
