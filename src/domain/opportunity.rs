use alloy::primitives::{Address, I256, U256};
use serde::{Deserialize, Serialize};

use super::gas::GasSettings;
use super::path::Path;

/// Complexity classification, used by the Risk Manager and Bundle Builder
/// to scale caution (larger/hairier trades get stricter gates). Derived
/// from the market signals a route actually carries rather than its shape,
/// since a short hop through a thin pool can be riskier than a long one
/// through deep, correlated pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Complexity {
    Simple,
    Complex,
    Advanced,
}

impl Complexity {
    /// `price_impact` and `volatility` are fractions (0.001 == 0.1%);
    /// `spread` is the fraction of the route's profit margin being
    /// captured, same units.
    pub fn classify(price_impact: f64, volatility: f64, spread: f64) -> Self {
        if price_impact >= 0.005 || volatility >= 0.5 {
            Complexity::Advanced
        } else if price_impact < 0.001 && volatility < 0.2 && spread > 0.002 {
            Complexity::Simple
        } else {
            Complexity::Complex
        }
    }
}

/// An immutable, fully-quoted candidate trade produced by the Pathfinder +
/// Quote Engine pipeline. Nothing downstream mutates an `Opportunity`; a
/// rejected or stale one is simply dropped and a fresh one rescanned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Opportunity {
    pub id: String,
    pub chain_id: u64,
    #[serde(skip)]
    pub path: Option<Path>,
    pub token_path_symbols: Vec<String>,
    pub input_token: Address,
    pub input_amount: U256,
    pub expected_output: U256,
    pub expected_profit: I256,
    pub expected_profit_usd: f64,
    /// Notional size of the trade in USD, independent of its profit — the
    /// figure the Risk Manager's per-trade gate weighs against capital.
    pub trade_size_usd: f64,
    /// Minimum-output tolerance recommended by the Slippage Advisor at
    /// discovery time, in basis points.
    pub slippage_bps: u32,
    pub complexity: Complexity,
    pub confidence: f64,
    /// Block after which this opportunity should be considered stale.
    pub valid_until_block: u64,
    pub gas: GasSettings,
    pub discovered_at_block: u64,
}

impl Opportunity {
    pub fn is_profitable(&self, min_profit_usd: f64) -> bool {
        self.expected_profit_usd >= min_profit_usd
    }

    /// Flattened view for downstream consumers still expecting the older
    /// scanner's opportunity shape (string complexity label, no gas
    /// breakdown, token path collapsed to symbols).
    pub fn to_legacy(&self) -> LegacyOpportunity {
        LegacyOpportunity {
            id: self.id.clone(),
            chain_id: self.chain_id,
            token_path: self.token_path_symbols.clone(),
            input_token: self.input_token,
            profit_usd: self.expected_profit_usd,
            confidence: self.confidence,
            complexity: self.complexity.as_legacy_str(),
            valid_until_block: self.valid_until_block,
        }
    }
}

impl Complexity {
    fn as_legacy_str(self) -> &'static str {
        match self {
            Complexity::Simple => "simple",
            Complexity::Complex => "complex",
            Complexity::Advanced => "advanced",
        }
    }
}

/// Backward-compatible opportunity format for downstream components built
/// against the earlier scanner's output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyOpportunity {
    pub id: String,
    pub chain_id: u64,
    pub token_path: Vec<String>,
    pub input_token: Address,
    pub profit_usd: f64,
    pub confidence: f64,
    pub complexity: &'static str,
    pub valid_until_block: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_simple_direct_arb() {
        assert_eq!(Complexity::classify(0.0005, 0.1, 0.003), Complexity::Simple);
    }

    #[test]
    fn classifies_tight_spread_as_complex() {
        // Low impact and volatility, but spread too thin to call it simple.
        assert_eq!(Complexity::classify(0.0005, 0.1, 0.001), Complexity::Complex);
    }

    #[test]
    fn classifies_high_impact_as_advanced() {
        assert_eq!(Complexity::classify(0.006, 0.1, 0.01), Complexity::Advanced);
    }

    #[test]
    fn classifies_high_volatility_as_advanced_even_with_low_impact() {
        assert_eq!(Complexity::classify(0.0005, 0.6, 0.01), Complexity::Advanced);
    }

    #[test]
    fn to_legacy_preserves_core_fields() {
        let opportunity = Opportunity {
            id: "abc".into(),
            chain_id: 42161,
            path: None,
            token_path_symbols: vec!["WETH".into(), "USDC".into(), "WETH".into()],
            input_token: Address::ZERO,
            input_amount: U256::from(1u64),
            expected_output: U256::from(1u64),
            expected_profit: I256::ZERO,
            expected_profit_usd: 12.5,
            trade_size_usd: 1000.0,
            slippage_bps: 50,
            complexity: Complexity::Simple,
            confidence: 0.9,
            valid_until_block: 100,
            gas: GasSettings {
                max_fee_per_gas: U256::from(1u64),
                max_priority_fee_per_gas: U256::from(1u64),
                gas_limit: 200_000,
                l1_data_cost_wei: U256::ZERO,
            },
            discovered_at_block: 99,
        };

        let legacy = opportunity.to_legacy();
        assert_eq!(legacy.id, "abc");
        assert_eq!(legacy.complexity, "simple");
        assert_eq!(legacy.profit_usd, 12.5);
        assert_eq!(legacy.token_path, opportunity.token_path_symbols);
    }
}
