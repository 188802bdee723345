//! Slippage Advisor: recommends a minimum-output tolerance in basis
//! points, widening it as volatility rises and liquidity/congestion make
//! the trade riskier to pin down exactly.

use crate::gas::pricer::Congestion;

const BASE_BPS: f64 = 50.0;
const VOLATILITY_WEIGHT_BPS: f64 = 200.0;
const LIQUIDITY_WEIGHT_BPS: f64 = 150.0;
const MIN_BPS: f64 = 10.0;
const MAX_BPS: f64 = 500.0;

pub struct SlippageAdvisor;

impl SlippageAdvisor {
    /// `trade_size_fraction_of_liquidity` is the trade's input amount as a
    /// fraction of the shallowest pool's liquidity depth along the path —
    /// larger fractions move the price more and need more slack.
    pub fn recommend_bps(
        volatility: f64,
        trade_size_fraction_of_liquidity: f64,
        congestion: Congestion,
    ) -> u32 {
        let congestion_term = match congestion {
            Congestion::Low => 0.0,
            Congestion::Medium => 5.0,
            Congestion::High => 15.0,
            Congestion::Severe => 40.0,
        };

        let raw = BASE_BPS
            + volatility.clamp(0.0, 1.0) * VOLATILITY_WEIGHT_BPS
            + trade_size_fraction_of_liquidity.clamp(0.0, 1.0) * LIQUIDITY_WEIGHT_BPS
            + congestion_term;

        raw.clamp(MIN_BPS, MAX_BPS).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calm_market_gets_base_slippage() {
        let bps = SlippageAdvisor::recommend_bps(0.0, 0.0, Congestion::Low);
        assert_eq!(bps, BASE_BPS as u32);
    }

    #[test]
    fn volatile_thin_congested_market_is_clamped_at_max() {
        let bps = SlippageAdvisor::recommend_bps(1.0, 1.0, Congestion::Severe);
        assert_eq!(bps, MAX_BPS as u32);
    }

    #[test]
    fn higher_volatility_increases_recommendation() {
        let calm = SlippageAdvisor::recommend_bps(0.1, 0.1, Congestion::Low);
        let volatile = SlippageAdvisor::recommend_bps(0.8, 0.1, Congestion::Low);
        assert!(volatile > calm);
    }
}
