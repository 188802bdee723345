//! Bundle Builder: turns a ranked, risk-cleared opportunity into an
//! on-chain submission, preferring a private relay and falling back to the
//! public mempool (or skipping entirely) when the relay can't take it.

use std::collections::HashSet;
use std::sync::Arc;

use alloy::primitives::{Address, TxHash, U256};
use alloy::rpc::types::eth::TransactionRequest;
use chrono::Utc;
use tracing::{info, warn};

use crate::chain::ChainGateway;
use crate::contracts::IArbExecutor;
use crate::domain::opportunity::Opportunity;
use crate::domain::trade::TradeRecord;
use crate::error::CoreError;
use crate::pathfinder::{CandidateKind, CycleCandidate};
use crate::risk::RiskManager;

use super::cooldown::{RouteCooldown, RouteKey};
use super::relay::{Bundle, RelayClient};

pub struct RankedCandidate {
    pub candidate: CycleCandidate,
    pub priority: f64,
}

pub struct BundleBuilder {
    gateway: Arc<ChainGateway>,
    relay: Arc<dyn RelayClient>,
    executor_address: Address,
}

impl BundleBuilder {
    pub fn new(gateway: Arc<ChainGateway>, relay: Arc<dyn RelayClient>, executor_address: Address) -> Self {
        Self {
            gateway,
            relay,
            executor_address,
        }
    }

    /// Priority = profit tier + spread tier + chain bonus + triangular
    /// bonus. `profit_margin` is already net of fees; `spread` approximates
    /// the pre-fee price gap by adding the aggregate fee back on, since
    /// candidates don't carry a distinct gross-spread figure.
    pub fn rank(candidates: Vec<CycleCandidate>) -> Vec<RankedCandidate> {
        let mut ranked: Vec<RankedCandidate> = candidates
            .into_iter()
            .map(|candidate| {
                let aggregate_fees: f64 = candidate.edges.iter().map(|e| e.fee).sum();
                let spread = candidate.score.profit_margin + aggregate_fees;
                let chain_bonus = if candidate.edges.first().map(|e| e.router.chain_id) == Some(42161) {
                    1.0
                } else {
                    0.0
                };
                let triangular_bonus = if candidate.kind == CandidateKind::Triangular { 1.0 } else { 0.0 };
                let priority = profit_tier(candidate.score.profit_margin) + spread_tier(spread) + chain_bonus + triangular_bonus;
                RankedCandidate { candidate, priority }
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.priority
                .partial_cmp(&a.priority)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    b.candidate
                        .score
                        .profit_margin
                        .partial_cmp(&a.candidate.score.profit_margin)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
        });
        ranked
    }

    /// Greedily selects the highest-priority candidates that don't share a
    /// router with an already-selected one, so two bundles never race for
    /// the same pool's state in the same block.
    pub fn select_non_conflicting(ranked: Vec<RankedCandidate>) -> Vec<RankedCandidate> {
        let mut used_routers: HashSet<Address> = HashSet::new();
        let mut selected = Vec::new();
        for entry in ranked {
            let conflicts = entry
                .candidate
                .edges
                .iter()
                .any(|e| used_routers.contains(&e.router.address));
            if conflicts {
                continue;
            }
            for edge in &entry.candidate.edges {
                used_routers.insert(edge.router.address);
            }
            selected.push(entry);
        }
        selected
    }

    pub fn build_transaction(
        &self,
        opportunity: &Opportunity,
        candidate: &CycleCandidate,
        min_profit: U256,
    ) -> TransactionRequest {
        let executor = IArbExecutor::new(self.executor_address, self.gateway.provider());

        let call = match candidate.kind {
            CandidateKind::Direct => {
                let token0 = candidate.tokens[0];
                let token1 = candidate.tokens[1];
                let router_buy = candidate.edges[0].router.address;
                let router_sell = candidate.edges[1].router.address;
                let fee_buy = candidate.edges[0].router.default_fee_tier();
                let fee_sell = candidate.edges[1].router.default_fee_tier();
                executor
                    .executeArb(
                        token0,
                        token1,
                        router_buy,
                        router_sell,
                        fee_buy,
                        fee_sell,
                        opportunity.input_amount,
                        min_profit,
                    )
                    .into_transaction_request()
            }
            CandidateKind::Triangular | CandidateKind::MultiHop => {
                let path: Vec<Address> = candidate.tokens.clone();
                let routers: Vec<Address> = candidate.edges.iter().map(|e| e.router.address).collect();
                let fees: Vec<u32> = candidate
                    .edges
                    .iter()
                    .map(|e| e.router.default_fee_tier())
                    .collect();
                executor
                    .executeTriangularArb(path, routers, fees, opportunity.input_amount, min_profit)
                    .into_transaction_request()
            }
        };

        call
    }

    /// Simulate -> send -> wait, with a private-relay-first, public-mempool
    /// fallback, and a chain-local route cooldown on repeated failure.
    pub async fn submit(
        &self,
        opportunity: &Opportunity,
        candidate: &CycleCandidate,
        tx: TransactionRequest,
        target_block: u64,
        risk: &mut RiskManager,
        cooldown: &mut RouteCooldown,
    ) -> TradeRecord {
        risk.check_gate().ok(); // caller has already gated; this just refreshes recovery state

        let route_key = route_key(candidate);
        let bundle = Bundle {
            transactions: vec![tx.clone()],
            target_block,
        };

        let simulation = self.relay.simulate(&bundle).await;
        let record = match simulation {
            Ok(sim) if sim.would_succeed => self.submit_via_relay_or_public(opportunity, &bundle, tx).await,
            Ok(sim) => {
                cooldown.record_failure(route_key, target_block);
                failed_record(
                    opportunity,
                    sim.revert_reason.unwrap_or_else(|| "simulation failed".into()),
                )
            }
            Err(err) => {
                cooldown.record_failure(route_key, target_block);
                failed_record(opportunity, err.to_string())
            }
        };

        if record.success {
            cooldown.record_success(&route_key);
        }
        risk.update_and_check(record.clone());
        record
    }

    async fn submit_via_relay_or_public(
        &self,
        opportunity: &Opportunity,
        bundle: &Bundle,
        tx: TransactionRequest,
    ) -> TradeRecord {
        match self.relay.send_bundle(bundle).await {
            Ok(receipt) => match self.relay.wait_for_inclusion(&receipt).await {
                Ok(true) => success_record(opportunity, receipt.included_tx_hashes.first().copied()),
                Ok(false) | Err(_) => {
                    warn!(opportunity_id = %opportunity.id, "relay bundle not included, falling back to public mempool");
                    self.submit_public(opportunity, tx).await
                }
            },
            Err(err) => {
                warn!(opportunity_id = %opportunity.id, error = %err, "relay submission failed, falling back to public mempool");
                self.submit_public(opportunity, tx).await
            }
        }
    }

    async fn submit_public(&self, opportunity: &Opportunity, tx: TransactionRequest) -> TradeRecord {
        match self.gateway.send_transaction(tx).await {
            Ok(hash) => {
                info!(opportunity_id = %opportunity.id, %hash, "submitted via public mempool");
                success_record(opportunity, Some(hash))
            }
            Err(err) => failed_record(opportunity, err.to_string()),
        }
    }
}

fn profit_tier(profit_margin: f64) -> f64 {
    if profit_margin >= 0.10 {
        5.0
    } else if profit_margin >= 0.05 {
        3.0
    } else if profit_margin >= 0.01 {
        1.0
    } else {
        0.0
    }
}

fn spread_tier(spread: f64) -> f64 {
    if spread >= 0.01 {
        3.0
    } else if spread >= 0.005 {
        2.0
    } else if spread >= 0.002 {
        1.0
    } else {
        0.0
    }
}

fn route_key(candidate: &CycleCandidate) -> RouteKey {
    let first = &candidate.edges[0].router;
    let last = &candidate.edges[candidate.edges.len() - 1].router;
    (candidate.tokens[0], first.kind, last.kind)
}

fn success_record(opportunity: &Opportunity, tx_hash: Option<TxHash>) -> TradeRecord {
    TradeRecord {
        opportunity_id: opportunity.id.clone(),
        chain_id: opportunity.chain_id,
        token: opportunity.input_token,
        trade_size_usd: opportunity.trade_size_usd,
        tx_hash,
        submitted_at: Utc::now(),
        success: true,
        realized_profit: opportunity.expected_profit,
        realized_profit_usd: opportunity.expected_profit_usd,
        gas_used: U256::from(opportunity.gas.gas_limit),
        gas_cost_usd: 0.0,
        error: None,
    }
}

fn failed_record(opportunity: &Opportunity, error: String) -> TradeRecord {
    TradeRecord {
        opportunity_id: opportunity.id.clone(),
        chain_id: opportunity.chain_id,
        token: opportunity.input_token,
        trade_size_usd: opportunity.trade_size_usd,
        tx_hash: None,
        submitted_at: Utc::now(),
        success: false,
        realized_profit: alloy::primitives::I256::ZERO,
        realized_profit_usd: 0.0,
        gas_used: U256::ZERO,
        gas_cost_usd: 0.0,
        error: Some(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::router::{Router, RouterKind};
    use crate::pathfinder::scoring::PathScore;
    use alloy::primitives::Address;

    fn router(addr: u8, kind: RouterKind) -> Router {
        Router {
            kind,
            name: format!("r{addr}"),
            chain_id: 42161,
            address: Address::repeat_byte(addr),
            factory: None,
            fee_tiers_bps: vec![3000, 500],
            liquidity_score: 0.9,
        }
    }

    fn candidate(priority_profit: f64, router_addr: u8) -> CycleCandidate {
        let edge = crate::domain::edge::Edge::new(
            Address::ZERO,
            Address::ZERO,
            router(router_addr, RouterKind::V2Amm),
            1.01,
            0.003,
            U256::from(1u64),
            U256::from(1u64),
            0,
        );
        CycleCandidate {
            kind: CandidateKind::Direct,
            tokens: vec![Address::ZERO, Address::repeat_byte(1), Address::ZERO],
            edges: vec![edge],
            total_weight: -0.01,
            score: PathScore {
                profit_margin: priority_profit,
                confidence: 1.0,
                valid_for_blocks: 3,
            },
        }
    }

    #[test]
    fn ranks_highest_profit_first() {
        let ranked = BundleBuilder::rank(vec![candidate(0.001, 1), candidate(0.02, 2)]);
        assert!(ranked[0].priority > ranked[1].priority);
    }

    #[test]
    fn non_conflicting_selection_drops_shared_router() {
        let ranked = BundleBuilder::rank(vec![candidate(0.02, 5), candidate(0.01, 5)]);
        let selected = BundleBuilder::select_non_conflicting(ranked);
        assert_eq!(selected.len(), 1);
    }
}
