//! Private relay protocol client: simulate, then submit, then wait for
//! inclusion. Modeled as a trait so the test suite can exercise the
//! Bundle Builder's fallback logic without a live relay.

use alloy::primitives::{Bytes, TxHash};
use alloy::rpc::types::eth::TransactionRequest;
use async_trait::async_trait;

use crate::error::CoreError;

#[derive(Debug, Clone)]
pub struct Bundle {
    pub transactions: Vec<TransactionRequest>,
    pub target_block: u64,
}

#[derive(Debug, Clone)]
pub struct SimulationOutcome {
    pub would_succeed: bool,
    pub revert_reason: Option<String>,
    pub gas_used: u64,
    pub return_data: Bytes,
}

#[derive(Debug, Clone)]
pub struct BundleReceipt {
    pub bundle_hash: String,
    pub included_tx_hashes: Vec<TxHash>,
}

#[async_trait]
pub trait RelayClient: Send + Sync {
    async fn simulate(&self, bundle: &Bundle) -> Result<SimulationOutcome, CoreError>;
    async fn send_bundle(&self, bundle: &Bundle) -> Result<BundleReceipt, CoreError>;
    async fn wait_for_inclusion(&self, receipt: &BundleReceipt) -> Result<bool, CoreError>;
}
