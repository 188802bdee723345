//! DEX Registry: the compile-time-known set of routers per chain, carrying
//! per-router liquidity scores and fee schedules rather than a bare enum.

use std::collections::HashMap;

use alloy::primitives::Address;
use once_cell::sync::Lazy;

use crate::domain::router::{Router, RouterKind};

fn addr(hex: &str) -> Address {
    hex.parse().expect("hardcoded router address must be valid")
}

static ROUTERS: Lazy<Vec<Router>> = Lazy::new(|| {
    vec![
        // Arbitrum One (42161)
        Router {
            kind: RouterKind::V2Amm,
            name: "SushiSwap V2".into(),
            chain_id: 42161,
            address: addr("0x1b02dA8Cb0d097eB8D57A175b88c7D8b47997506"),
            factory: Some(addr("0xc35DADB65012eC5796536bD9864eD8773aBc74C4")),
            fee_tiers_bps: vec![30],
            liquidity_score: 0.55,
        },
        Router {
            kind: RouterKind::V3Amm,
            name: "Uniswap V3".into(),
            chain_id: 42161,
            address: addr("0xE592427A0AEce92De3Edee1F18E0157C05861564"),
            factory: Some(addr("0x1F98431c8aD98523631AE4a59f267346ea31F984")),
            fee_tiers_bps: vec![3000, 500],
            liquidity_score: 0.95,
        },
        Router {
            kind: RouterKind::V3Amm,
            name: "Camelot V3".into(),
            chain_id: 42161,
            address: addr("0x1F721E2E82F6676FCE4eA07A5958cF098D339e18"),
            factory: Some(addr("0x1a3c9B1d2F0529D97f2afC5136Cc23e58f1FD35B")),
            fee_tiers_bps: vec![3000, 500],
            liquidity_score: 0.7,
        },
        Router {
            kind: RouterKind::StableCurve,
            name: "Curve".into(),
            chain_id: 42161,
            address: addr("0x7544Fe3d184b6B55D6B36c3FCA1157eE0Ba30287"),
            factory: None,
            fee_tiers_bps: vec![4],
            liquidity_score: 0.6,
        },
        // Optimism (10)
        Router {
            kind: RouterKind::V3Amm,
            name: "Uniswap V3".into(),
            chain_id: 10,
            address: addr("0xE592427A0AEce92De3Edee1F18E0157C05861564"),
            factory: Some(addr("0x1F98431c8aD98523631AE4a59f267346ea31F984")),
            fee_tiers_bps: vec![3000, 500],
            liquidity_score: 0.9,
        },
        Router {
            kind: RouterKind::V2Amm,
            name: "Velodrome V2".into(),
            chain_id: 10,
            address: addr("0xa062aE8A9c5e11aaA026fc2670B0D65cCc8B2858"),
            factory: Some(addr("0xF1046053aa5682b4F9a81b5481394DA16BE5FF5a")),
            fee_tiers_bps: vec![5, 30],
            liquidity_score: 0.75,
        },
        Router {
            kind: RouterKind::WeightedPool,
            name: "Balancer".into(),
            chain_id: 10,
            address: addr("0xBA12222222228d8Ba445958a75a0704d566BF00"),
            factory: None,
            fee_tiers_bps: vec![],
            liquidity_score: 0.5,
        },
    ]
});

/// Liquidity score above which a router counts as "high liquidity" for
/// `arbitrage_pairs`'s prioritization.
const HIGH_LIQUIDITY_THRESHOLD: f64 = 0.7;

pub struct DexRegistry;

impl DexRegistry {
    /// Routers on `chain_id`, sorted by liquidity score descending.
    pub fn all(chain_id: u64) -> Vec<&'static Router> {
        let mut routers: Vec<&'static Router> =
            ROUTERS.iter().filter(|r| r.chain_id == chain_id).collect();
        routers.sort_by(|a, b| {
            b.liquidity_score
                .partial_cmp(&a.liquidity_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        routers
    }

    pub fn for_chain(chain_id: u64) -> Vec<&'static Router> {
        Self::all(chain_id)
    }

    pub fn by_kind(chain_id: u64, kinds: &[RouterKind], min_score: f64) -> Vec<&'static Router> {
        ROUTERS
            .iter()
            .filter(|r| r.chain_id == chain_id && kinds.contains(&r.kind) && r.liquidity_score >= min_score)
            .collect()
    }

    /// All unordered pairs of routers on the same chain, the candidate set
    /// for direct dual-router arbitrage — ordered so pairs most likely to
    /// diverge in price (different fee schedules, or both deep pools) are
    /// evaluated first.
    pub fn arbitrage_pairs(chain_id: u64) -> Vec<(&'static Router, &'static Router)> {
        let routers = Self::all(chain_id);
        let mut pairs = Vec::new();
        for i in 0..routers.len() {
            for j in (i + 1)..routers.len() {
                pairs.push((routers[i], routers[j]));
            }
        }
        pairs.sort_by(|a, b| {
            pair_priority(b.0, b.1)
                .partial_cmp(&pair_priority(a.0, a.1))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        pairs
    }

    pub fn coverage_stats() -> HashMap<u64, usize> {
        let mut stats = HashMap::new();
        for router in ROUTERS.iter() {
            *stats.entry(router.chain_id).or_insert(0) += 1;
        }
        stats
    }
}

fn pair_priority(a: &Router, b: &Router) -> f64 {
    let different_fee_schedules = a.fee_tiers_bps != b.fee_tiers_bps;
    let both_high_liquidity =
        a.liquidity_score >= HIGH_LIQUIDITY_THRESHOLD && b.liquidity_score >= HIGH_LIQUIDITY_THRESHOLD;
    let mut priority = 0.0;
    if different_fee_schedules {
        priority += 1.0;
    }
    if both_high_liquidity {
        priority += 1.0;
    }
    // Tiebreaker within a priority tier; too small to outrank either bonus.
    priority + (a.liquidity_score + b.liquidity_score) / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_router_has_a_home_chain() {
        for chain_id in [42161, 10] {
            for router in DexRegistry::all(chain_id) {
                assert_eq!(router.chain_id, chain_id);
            }
        }
    }

    #[test]
    fn all_is_sorted_by_liquidity_descending() {
        let routers = DexRegistry::all(42161);
        for pair in routers.windows(2) {
            assert!(pair[0].liquidity_score >= pair[1].liquidity_score);
        }
    }

    #[test]
    fn by_kind_filters_on_kind_set_and_min_score() {
        let routers = DexRegistry::by_kind(42161, &[RouterKind::V3Amm], 0.8);
        assert!(routers.iter().all(|r| r.kind == RouterKind::V3Amm && r.liquidity_score >= 0.8));
        assert!(!routers.is_empty());
    }

    #[test]
    fn arbitrage_pairs_excludes_self_pairs() {
        let pairs = DexRegistry::arbitrage_pairs(42161);
        assert!(pairs.iter().all(|(a, b)| a.address != b.address));
    }

    #[test]
    fn arbitrage_pairs_ranks_different_fee_schedules_first() {
        let pairs = DexRegistry::arbitrage_pairs(42161);
        let top = pairs.first().expect("arbitrum has arbitrage pairs");
        assert!(pair_priority(top.0, top.1) >= 1.0);
    }

    #[test]
    fn coverage_stats_counts_both_chains() {
        let stats = DexRegistry::coverage_stats();
        assert!(stats.contains_key(&42161));
        assert!(stats.contains_key(&10));
    }
}
