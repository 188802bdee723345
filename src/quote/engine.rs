//! Quote Engine: router-kind-aware view calls that turn a
//! `(token_in, token_out, amount_in)` request into an executable rate,
//! with V3's fee-tier fallback and classified failure modes so the
//! Pathfinder can tell "no pool" apart from "RPC hiccup."

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, U256};

use crate::chain::ChainGateway;
use crate::contracts::{IQuoterV2, IUniswapV2Factory, IUniswapV2Router02};
use crate::domain::router::{Router, RouterKind};
use crate::error::CoreError;

const QUOTE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy)]
pub struct Quote {
    pub amount_out: U256,
    pub fee_tier_bps: u32,
}

pub struct QuoteEngine {
    gateway: Arc<ChainGateway>,
    /// V3 quoter contract address for this chain (e.g. Uniswap's `IQuoterV2`
    /// deployment), shared across every V3 router on the chain.
    quoter_v2: Address,
}

impl QuoteEngine {
    pub fn new(gateway: Arc<ChainGateway>, quoter_v2: Address) -> Self {
        Self { gateway, quoter_v2 }
    }

    pub async fn quote(
        &self,
        router: &Router,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
    ) -> Result<Quote, CoreError> {
        let outcome = tokio::time::timeout(
            QUOTE_TIMEOUT,
            self.quote_inner(router, token_in, token_out, amount_in),
        )
        .await;

        match outcome {
            Ok(result) => result,
            Err(_) => Err(CoreError::Timeout {
                elapsed_ms: QUOTE_TIMEOUT.as_millis() as u64,
            }),
        }
    }

    async fn quote_inner(
        &self,
        router: &Router,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
    ) -> Result<Quote, CoreError> {
        match router.kind {
            RouterKind::V2Amm => self.quote_v2(router, token_in, token_out, amount_in).await,
            RouterKind::V3Amm => self.quote_v3(router, token_in, token_out, amount_in).await,
            // Curve, Balancer-style weighted pools, and perp-spot venues
            // have no wired ABI yet; treated as a permanent sentinel
            // "unavailable" rather than guessed at, per the decision to
            // skip rather than misquote.
            RouterKind::StableCurve | RouterKind::WeightedPool | RouterKind::PerpSpot => {
                Err(CoreError::NoPool {
                    token_a: token_in,
                    token_b: token_out,
                    router: router.address,
                })
            }
        }
    }

    async fn quote_v2(
        &self,
        router: &Router,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
    ) -> Result<Quote, CoreError> {
        let factory_address = router.factory.ok_or_else(|| CoreError::NoPool {
            token_a: token_in,
            token_b: token_out,
            router: router.address,
        })?;

        let factory = IUniswapV2Factory::new(factory_address, self.gateway.provider());
        let pair = factory
            .getPair(token_in, token_out)
            .call()
            .await
            .map_err(|e| CoreError::RevertOther {
                reason: e.to_string(),
            })?;
        if pair.is_zero() {
            return Err(CoreError::NoPool {
                token_a: token_in,
                token_b: token_out,
                router: router.address,
            });
        }

        let router_contract = IUniswapV2Router02::new(router.address, self.gateway.provider());
        let path = vec![token_in, token_out];
        let amounts = router_contract
            .getAmountsOut(amount_in, path)
            .call()
            .await
            .map_err(|e| CoreError::RevertOther {
                reason: e.to_string(),
            })?;
        let amount_out = *amounts.last().ok_or_else(|| CoreError::InvalidResponse {
            call: "getAmountsOut".into(),
            detail: "empty amounts array".into(),
        })?;

        Ok(Quote {
            amount_out,
            fee_tier_bps: 30,
        })
    }

    /// Tries the router's preferred (typically 0.30%) fee tier first, then
    /// falls back to its second-listed tier (typically 0.05%) if the first
    /// reverts with no pool deployed at that tier.
    async fn quote_v3(
        &self,
        router: &Router,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
    ) -> Result<Quote, CoreError> {
        let primary = router.default_fee_tier();
        match self.quote_v3_at_fee(token_in, token_out, amount_in, primary).await {
            Ok(amount_out) => Ok(Quote {
                amount_out,
                fee_tier_bps: primary,
            }),
            Err(CoreError::NoPool { .. }) => {
                let fallback = router.fallback_fee_tier().ok_or_else(|| CoreError::NoPool {
                    token_a: token_in,
                    token_b: token_out,
                    router: router.address,
                })?;
                let amount_out = self
                    .quote_v3_at_fee(token_in, token_out, amount_in, fallback)
                    .await?;
                Ok(Quote {
                    amount_out,
                    fee_tier_bps: fallback,
                })
            }
            Err(other) => Err(other),
        }
    }

    async fn quote_v3_at_fee(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
        fee_bps: u32,
    ) -> Result<U256, CoreError> {
        let quoter = IQuoterV2::new(self.quoter_v2, self.gateway.provider());
        let params = IQuoterV2::QuoteExactInputSingleParams {
            tokenIn: token_in,
            tokenOut: token_out,
            amountIn: amount_in,
            fee: fee_bps,
            sqrtPriceLimitX96: Default::default(),
        };
        let result = quoter
            .quoteExactInputSingle(params)
            .call()
            .await
            .map_err(|e| {
                // QuoterV2 reverts (rather than returning zero) when no pool
                // is deployed at the requested fee tier.
                let message = e.to_string();
                if message.contains("execution reverted") || message.contains("Unable to fetch") {
                    CoreError::NoPool {
                        token_a: token_in,
                        token_b: token_out,
                        router: Address::ZERO,
                    }
                } else {
                    CoreError::RevertOther { reason: message }
                }
            })?;
        Ok(result.amountOut)
    }
}
