//! Chain Gateway: the only component that talks to an RPC endpoint
//! directly. Everything else calls through here so timeouts, retries, and
//! chain-id validation live in one place.

use std::sync::Arc;
use std::time::Duration;

use alloy::network::Ethereum;
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::eth::TransactionRequest;

use crate::error::CoreError;

use super::retry::{with_retry, RetryPolicy};

#[derive(Debug, Clone, Copy)]
pub struct FeeEstimate {
    pub base_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
    /// `gasUsed / gasLimit` of the latest block, `0.0` if it couldn't be
    /// fetched. Feeds the Gas Pricer's congestion estimate.
    pub gas_used_ratio: f64,
    /// Pending-mempool depth relative to `PENDING_TX_CAPACITY`, clamped to
    /// `[0, 1]`. `0.0` on RPCs that don't expose `txpool_status` (common on
    /// rollup nodes), which is honest about the signal simply being absent
    /// rather than pretending the mempool is empty.
    pub pending_tx_ratio: f64,
}

/// Rough expected in-flight transaction count used to normalize
/// `txpool_status`'s pending count into a `[0, 1]` ratio. Rollup mempools
/// run far shallower than L1's, hence the small cap.
const PENDING_TX_CAPACITY: u64 = 200;

pub struct ChainGateway {
    pub chain_id: u64,
    provider: DynProvider<Ethereum>,
    retry: RetryPolicy,
}

impl ChainGateway {
    /// Connects over HTTP(S)/WS depending on the scheme in `rpc_url`, then
    /// verifies the endpoint actually serves `expected_chain_id` before
    /// returning — catching misconfigured RPC pools immediately rather
    /// than after the first failed quote.
    pub async fn connect(rpc_url: &str, expected_chain_id: u64) -> Result<Self, CoreError> {
        let provider = ProviderBuilder::new()
            .connect(rpc_url)
            .await
            .map_err(|e| CoreError::NetworkUnavailable {
                chain_id: expected_chain_id,
                source: e.into(),
            })?
            .erased();

        let gateway = Self {
            chain_id: expected_chain_id,
            provider,
            retry: RetryPolicy::default(),
        };
        gateway.verify_chain_id().await?;
        Ok(gateway)
    }

    async fn verify_chain_id(&self) -> Result<(), CoreError> {
        let actual = self
            .provider
            .get_chain_id()
            .await
            .map_err(|e| CoreError::NetworkUnavailable {
                chain_id: self.chain_id,
                source: e.into(),
            })?;
        if actual != self.chain_id {
            return Err(CoreError::ChainMismatch {
                expected: self.chain_id,
                actual,
            });
        }
        Ok(())
    }

    /// Rejects anything that isn't a valid EIP-55 checksum (or all-lowercase)
    /// address, per C1's validation rule, before it reaches a call site.
    pub fn validate_address(raw: &str) -> Result<Address, CoreError> {
        Address::parse_checksummed(raw, None)
            .or_else(|_| raw.parse::<Address>())
            .map_err(|e| CoreError::InvalidResponse {
                call: "validate_address".into(),
                detail: format!("{raw}: {e}"),
            })
    }

    pub async fn block_number(&self) -> Result<u64, CoreError> {
        with_retry(&self.retry, "block_number", || async {
            self.provider
                .get_block_number()
                .await
                .map_err(|e| CoreError::NetworkUnavailable {
                    chain_id: self.chain_id,
                    source: e.into(),
                })
        })
        .await
    }

    pub async fn fee_estimate(&self) -> Result<FeeEstimate, CoreError> {
        with_retry(&self.retry, "fee_estimate", || async {
            let fees = self
                .provider
                .estimate_eip1559_fees()
                .await
                .map_err(|e| CoreError::NetworkUnavailable {
                    chain_id: self.chain_id,
                    source: e.into(),
                })?;
            Ok(FeeEstimate {
                base_fee_per_gas: U256::from(fees.max_fee_per_gas - fees.max_priority_fee_per_gas),
                max_priority_fee_per_gas: U256::from(fees.max_priority_fee_per_gas),
                gas_used_ratio: self.gas_used_ratio().await,
                pending_tx_ratio: self.pending_tx_ratio().await,
            })
        })
        .await
    }

    /// Best-effort block utilization from the latest block's header. Not
    /// retried: a transient miss here just means congestion falls back to
    /// its base-fee estimate for this one scan.
    async fn gas_used_ratio(&self) -> f64 {
        let block = match self
            .provider
            .get_block_by_number(alloy::eips::BlockNumberOrTag::Latest)
            .await
        {
            Ok(Some(block)) => block,
            _ => return 0.0,
        };
        let gas_limit = block.header.gas_limit as f64;
        if gas_limit <= 0.0 {
            return 0.0;
        }
        (block.header.gas_used as f64 / gas_limit).clamp(0.0, 1.0)
    }

    /// Best-effort pending-mempool estimate. Many rollup RPC endpoints
    /// don't expose `txpool_status`; treated as "no signal" rather than an
    /// error.
    async fn pending_tx_ratio(&self) -> f64 {
        match self.provider.txpool_status().await {
            Ok(status) => {
                let pending: u64 = status.pending.try_into().unwrap_or(u64::MAX);
                (pending as f64 / PENDING_TX_CAPACITY as f64).min(1.0)
            }
            Err(_) => 0.0,
        }
    }

    pub async fn balance_of(&self, account: Address) -> Result<U256, CoreError> {
        with_retry(&self.retry, "balance_of", || async {
            self.provider
                .get_balance(account)
                .await
                .map_err(|e| CoreError::NetworkUnavailable {
                    chain_id: self.chain_id,
                    source: e.into(),
                })
        })
        .await
    }

    /// Executes an eth_call, mapping a revert into `CoreError::RevertOther`
    /// rather than the timeout/network variants (callers like the Quote
    /// Engine distinguish "pool doesn't exist" from "RPC is down").
    pub async fn call(&self, request: TransactionRequest) -> Result<Vec<u8>, CoreError> {
        with_retry(&self.retry, "call", || {
            let request = request.clone();
            async {
                self.provider
                    .call(request)
                    .await
                    .map(|bytes| bytes.to_vec())
                    .map_err(|e| CoreError::RevertOther {
                        reason: e.to_string(),
                    })
            }
        })
        .await
    }

    pub async fn send_transaction(&self, request: TransactionRequest) -> Result<TxHash, CoreError> {
        let pending = self
            .provider
            .send_transaction(request)
            .await
            .map_err(|e| CoreError::RelaySubmissionFailed {
                kind: e.to_string(),
            })?;
        Ok(*pending.tx_hash())
    }

    pub fn provider(&self) -> &DynProvider<Ethereum> {
        &self.provider
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_checksum_address() {
        let addr = ChainGateway::validate_address("0x82aF49447D8a07e3bd95BD0d56f35241523fBab1");
        assert!(addr.is_ok());
    }

    #[test]
    fn rejects_garbage_address() {
        assert!(ChainGateway::validate_address("not-an-address").is_err());
    }
}
