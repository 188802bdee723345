use alloy::primitives::{Address, U256};

use super::router::Router;

/// One directed hop in the arbitrage graph: built fresh every scan from a
/// `Quote`, used to run Bellman-Ford, then discarded.
#[derive(Debug, Clone)]
pub struct Edge {
    pub from: Address,
    pub to: Address,
    pub router: Router,
    /// Output-per-input exchange rate, `amount_out / amount_in` in token
    /// decimal terms (a ratio, hence `f64`).
    pub rate: f64,
    /// Fee fraction in `[0, 1]`.
    pub fee: f64,
    pub liquidity_depth: U256,
    pub gas_estimate: U256,
    pub last_update_block: u64,
}

impl Edge {
    pub fn new(
        from: Address,
        to: Address,
        router: Router,
        rate: f64,
        fee: f64,
        liquidity_depth: U256,
        gas_estimate: U256,
        last_update_block: u64,
    ) -> Self {
        Self {
            from,
            to,
            router,
            rate,
            fee,
            liquidity_depth,
            gas_estimate,
            last_update_block,
        }
    }

    /// Bellman-Ford edge weight: `-ln(rate * (1 - fee))`.
    ///
    /// A profitable cycle has total weight < 0 because the product of the
    /// rates along it exceeds 1; summing negative logs turns "product > 1"
    /// into "sum < 0", which is exactly what negative-cycle detection finds.
    pub fn weight(&self) -> f64 {
        let effective_rate = self.rate * (1.0 - self.fee);
        if effective_rate <= 0.0 {
            f64::INFINITY
        } else {
            -effective_rate.ln()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::router::RouterKind;

    fn router() -> Router {
        Router {
            kind: RouterKind::V2Amm,
            name: "test".into(),
            chain_id: 42161,
            address: Address::ZERO,
            factory: None,
            fee_tiers_bps: vec![],
            liquidity_score: 1.0,
        }
    }

    #[test]
    fn weight_is_negative_when_rate_profitable() {
        let edge = Edge::new(
            Address::ZERO,
            Address::ZERO,
            router(),
            1.01,
            0.003,
            U256::from(1_000_000u64),
            U256::from(100_000u64),
            1,
        );
        assert!(edge.weight() < 0.0);
    }

    #[test]
    fn weight_is_positive_when_rate_at_parity_with_fee() {
        let edge = Edge::new(
            Address::ZERO,
            Address::ZERO,
            router(),
            1.0,
            0.003,
            U256::from(1_000_000u64),
            U256::from(100_000u64),
            1,
        );
        assert!(edge.weight() > 0.0);
    }
}
