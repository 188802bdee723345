//! Path scoring: turns a raw negative-weight cycle or multi-hop candidate
//! into a profit margin, a confidence score, and a validity window, so the
//! scheduler can rank candidates before paying for quotes on all of them.

use crate::domain::edge::Edge;

#[derive(Debug, Clone, Copy)]
pub struct PathScore {
    /// Fractional return of the cycle, e.g. `0.004` for 0.4%.
    pub profit_margin: f64,
    /// `[0.1, 0.95]`, derived from hop complexity, average router liquidity,
    /// and aggregate fees.
    pub confidence: f64,
    /// Number of blocks this candidate should be considered fresh for.
    pub valid_for_blocks: u64,
}

/// `profit_margin = exp(-total_weight) - 1`: `total_weight` is the sum of
/// `-ln(rate * (1 - fee))` across the cycle, so `exp(-total_weight)` is the
/// product of the post-fee rates — the multiplicative return of the cycle.
pub fn profit_margin(total_weight: f64) -> f64 {
    (-total_weight).exp() - 1.0
}

/// Average block time in seconds, used to convert the scored validity
/// window (in seconds) into a block count. Falls back to Ethereum mainnet's
/// cadence for anything not explicitly covered.
fn block_time_seconds(chain_id: u64) -> f64 {
    match chain_id {
        42161 => 0.25, // Arbitrum One
        10 => 2.0,     // Optimism
        _ => 12.0,
    }
}

/// `complexity` is the hop count of the candidate path (number of edges
/// traversed). `score_path` is the single source of the candidate's
/// confidence and time-window scores; nothing else should recompute them.
pub fn score_path(edges: &[Edge], total_weight: f64, complexity: f64) -> PathScore {
    let margin = profit_margin(total_weight);

    let avg_liquidity_score = if edges.is_empty() {
        0.0
    } else {
        edges.iter().map(|e| e.router.liquidity_score).sum::<f64>() / edges.len() as f64
    };
    // The formula is expressed against a 0-10 liquidity scale; routers carry
    // liquidity_score on a 0-1 scale, so rescale before applying it.
    let avg_liquidity_10 = avg_liquidity_score * 10.0;
    let aggregate_fees: f64 = edges.iter().map(|e| e.fee).sum();

    let confidence =
        (0.8 - 0.05 * complexity + 0.02 * (avg_liquidity_10 - 5.0) - 2.0 * aggregate_fees).clamp(0.1, 0.95);

    let window_seconds = (15.0 - 2.0 * complexity + 2.0 * (avg_liquidity_10 - 5.0)).clamp(5.0, 30.0);
    let chain_id = edges.first().map(|e| e.router.chain_id).unwrap_or(42161);
    let valid_for_blocks = ((window_seconds / block_time_seconds(chain_id)).round() as u64).max(1);

    PathScore {
        profit_margin: margin,
        confidence,
        valid_for_blocks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::router::{Router, RouterKind};
    use alloy::primitives::{Address, U256};

    fn edge_on(chain_id: u64, liquidity_score: f64) -> Edge {
        let router = Router {
            kind: RouterKind::V2Amm,
            name: "r".into(),
            chain_id,
            address: Address::ZERO,
            factory: None,
            fee_tiers_bps: vec![],
            liquidity_score,
        };
        Edge::new(
            Address::ZERO,
            Address::ZERO,
            router,
            1.01,
            0.003,
            U256::from(1u64),
            U256::from(1u64),
            0,
        )
    }

    fn edge(liquidity_score: f64) -> Edge {
        edge_on(42161, liquidity_score)
    }

    #[test]
    fn profit_margin_is_positive_for_negative_weight() {
        assert!(profit_margin(-0.05) > 0.0);
    }

    #[test]
    fn profit_margin_is_negative_for_positive_weight() {
        assert!(profit_margin(0.05) < 0.0);
    }

    #[test]
    fn more_hops_reduce_confidence() {
        let two_hop = score_path(&[edge(0.9), edge(0.9)], -0.02, 2.0);
        let four_hop = score_path(&[edge(0.9), edge(0.9), edge(0.9), edge(0.9)], -0.02, 4.0);
        assert!(four_hop.confidence < two_hop.confidence);
    }

    #[test]
    fn higher_liquidity_raises_confidence() {
        let thin = score_path(&[edge(0.2)], -0.02, 1.0);
        let deep = score_path(&[edge(0.9)], -0.02, 1.0);
        assert!(deep.confidence > thin.confidence);
    }

    #[test]
    fn confidence_and_window_stay_within_spec_bounds() {
        let extreme = score_path(&[edge(0.0), edge(0.0), edge(0.0), edge(0.0), edge(0.0)], -0.02, 10.0);
        assert!((0.1..=0.95).contains(&extreme.confidence));

        let lax = score_path(&[edge(1.0)], -0.02, 0.0);
        assert!((0.1..=0.95).contains(&lax.confidence));
    }

    #[test]
    fn faster_chains_get_more_blocks_for_the_same_window() {
        let arbitrum = score_path(&[edge_on(42161, 0.9)], -0.02, 1.0);
        let optimism = score_path(&[edge_on(10, 0.9)], -0.02, 1.0);
        assert!(arbitrum.valid_for_blocks > optimism.valid_for_blocks);
    }
}
