//! Profit Thresholder: the minimum profit required before an opportunity is
//! even worth quoting further, scaled by available capital and the
//! prevailing market regime, then raised further if the current gas
//! estimate would otherwise leave too thin a profit/gas ratio.

use alloy::primitives::U256;

const NATIVE_DECIMALS: u32 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketRegime {
    Calm,
    Normal,
    Turbulent,
}

impl MarketRegime {
    fn factor(self) -> f64 {
        match self {
            MarketRegime::Calm => 0.8,
            MarketRegime::Normal => 1.0,
            MarketRegime::Turbulent => 1.6,
        }
    }
}

/// How willing the thresholder is to let thin opportunities through, given
/// the floor it just computed relative to capital and regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    Conservative,
    Balanced,
    Aggressive,
}

#[derive(Debug, Clone)]
pub struct ThresholdAssessment {
    pub min_profit_wei: U256,
    pub threshold_bps: u32,
    pub recommendation: Recommendation,
    pub reasoning: Vec<String>,
}

const BASE_FLOOR_FRACTION_OF_CAPITAL: f64 = 0.0005; // 5 bps of deployed capital
const MIN_FLOOR_USD: f64 = 2.0;
/// Minimum expected-profit/gas-cost ratio the floor must leave in place at
/// the current gas estimate.
const MIN_PROFIT_TO_GAS_RATIO: f64 = 1.5;

pub struct ProfitThresholder;

impl ProfitThresholder {
    /// The capital- and regime-scaled floor in USD, before the gas-estimate
    /// adjustment. Exposed on its own because callers that only need a
    /// quick veto threshold (no gas estimate in hand yet) can use it
    /// directly; `assess` is the full C9 computation.
    pub fn min_profit_usd(capital_usd: f64, regime: MarketRegime, recent_gas_to_profit_ratio: f64) -> f64 {
        let base = (capital_usd * BASE_FLOOR_FRACTION_OF_CAPITAL).max(MIN_FLOOR_USD);
        let regime_adjusted = base * regime.factor();

        // A history of gas eating a large share of profit raises the bar;
        // a history of gas being a rounding error lowers it back toward
        // the unadjusted floor, but never below it.
        let gas_adjustment = 1.0 + recent_gas_to_profit_ratio.clamp(0.0, 2.0);
        regime_adjusted * gas_adjustment
    }

    /// Full assessment: capital-scaled floor, adjusted for regime and
    /// recent gas history, then raised if needed so that
    /// `estimated_gas_cost_usd * 1.5` is still clearable, expressed as a
    /// native-token wei amount and a basis-point fraction of capital.
    pub fn assess(
        capital_usd: f64,
        native_price_usd: f64,
        regime: MarketRegime,
        recent_gas_to_profit_ratio: f64,
        estimated_gas_cost_usd: f64,
    ) -> ThresholdAssessment {
        let mut reasoning = Vec::new();

        let mut floor_usd = Self::min_profit_usd(capital_usd, regime, recent_gas_to_profit_ratio);
        reasoning.push(format!(
            "{:?} regime, recent gas/profit {:.2} -> capital-scaled floor ${:.2}",
            regime, recent_gas_to_profit_ratio, floor_usd
        ));

        let gas_bound_usd = estimated_gas_cost_usd * MIN_PROFIT_TO_GAS_RATIO;
        if gas_bound_usd > floor_usd {
            reasoning.push(format!(
                "raised to ${gas_bound_usd:.2} to keep expected-profit/gas-cost >= {MIN_PROFIT_TO_GAS_RATIO} \
                 at an estimated gas cost of ${estimated_gas_cost_usd:.2}"
            ));
            floor_usd = gas_bound_usd;
        }

        let threshold_bps = if capital_usd > 0.0 {
            ((floor_usd / capital_usd) * 10_000.0).round().clamp(0.0, u32::MAX as f64) as u32
        } else {
            0
        };

        let min_profit_wei = if native_price_usd > 0.0 {
            let native_amount = floor_usd / native_price_usd;
            let wei = native_amount * 10f64.powi(NATIVE_DECIMALS as i32);
            U256::try_from(wei.max(0.0)).unwrap_or(U256::MAX)
        } else {
            U256::ZERO
        };

        let recommendation = match regime {
            MarketRegime::Calm => Recommendation::Aggressive,
            MarketRegime::Normal => Recommendation::Balanced,
            MarketRegime::Turbulent => Recommendation::Conservative,
        };

        ThresholdAssessment {
            min_profit_wei,
            threshold_bps,
            recommendation,
            reasoning,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turbulent_regime_raises_the_floor() {
        let calm = ProfitThresholder::min_profit_usd(100_000.0, MarketRegime::Calm, 0.1);
        let turbulent = ProfitThresholder::min_profit_usd(100_000.0, MarketRegime::Turbulent, 0.1);
        assert!(turbulent > calm);
    }

    #[test]
    fn small_capital_still_gets_a_minimum_floor() {
        let floor = ProfitThresholder::min_profit_usd(100.0, MarketRegime::Normal, 0.0);
        assert!(floor >= MIN_FLOOR_USD);
    }

    #[test]
    fn high_gas_ratio_raises_the_floor() {
        let cheap_gas = ProfitThresholder::min_profit_usd(100_000.0, MarketRegime::Normal, 0.0);
        let expensive_gas = ProfitThresholder::min_profit_usd(100_000.0, MarketRegime::Normal, 1.5);
        assert!(expensive_gas > cheap_gas);
    }

    #[test]
    fn gas_estimate_can_raise_the_floor_above_the_capital_scaled_one() {
        let capital_only = ProfitThresholder::min_profit_usd(100_000.0, MarketRegime::Normal, 0.0);
        let assessment = ProfitThresholder::assess(100_000.0, 3_000.0, MarketRegime::Normal, 0.0, capital_only * 10.0);
        assert!(assessment.reasoning.iter().any(|r| r.contains("raised to")));
        assert!(assessment.min_profit_wei > U256::ZERO);
    }

    #[test]
    fn recommendation_tracks_regime() {
        let calm = ProfitThresholder::assess(100_000.0, 3_000.0, MarketRegime::Calm, 0.0, 1.0);
        let turbulent = ProfitThresholder::assess(100_000.0, 3_000.0, MarketRegime::Turbulent, 0.0, 1.0);
        assert_eq!(calm.recommendation, Recommendation::Aggressive);
        assert_eq!(turbulent.recommendation, Recommendation::Conservative);
    }
}
