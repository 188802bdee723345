use std::collections::HashMap;

use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The three-state machine proper: `Armed -> Tripped -> CoolingDown -> Armed`.
/// Kept distinct from `CircuitBreakerState` (which carries the *why* and
/// *when* around the phase) so callers that only care about the phase don't
/// have to pattern-match a struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BreakerPhase {
    Armed,
    Tripped,
    CoolingDown,
}

/// Full circuit breaker state: which phase it's in, when it last tripped,
/// the human-readable reasons that tripped it, when it's next eligible to
/// leave `Tripped`, and whether a manual override was declared permissible
/// at the moment it tripped (P&L-driven trips never allow an override; a
/// pure failure-rate or gas-ratio trip does).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerState {
    pub phase: BreakerPhase,
    pub active: bool,
    pub activated_at: Option<DateTime<Utc>>,
    pub reasons: Vec<String>,
    pub resume_at: Option<DateTime<Utc>>,
    pub override_allowed: bool,
}

impl CircuitBreakerState {
    pub fn armed() -> Self {
        Self {
            phase: BreakerPhase::Armed,
            active: false,
            activated_at: None,
            reasons: Vec::new(),
            resume_at: None,
            override_allowed: false,
        }
    }

    pub fn is_tripped(&self) -> bool {
        self.phase == BreakerPhase::Tripped
    }
}

/// Risk level returned by the per-trade gate, scaling how much headroom a
/// trade needs over its constraints before it's allowed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Minimum `Opportunity::confidence` required to execute at this level.
    pub fn minimum_confidence(self) -> f64 {
        match self {
            RiskLevel::Low | RiskLevel::Medium => 0.75,
            RiskLevel::High => 0.80,
            RiskLevel::Critical => 0.95,
        }
    }
}

/// Outcome of `RiskManager::assess_trade_risk`: whether the trade clears the
/// per-trade gate, at what risk level, and the largest position size that
/// would currently clear every per-trade limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRiskAssessment {
    pub approved: bool,
    pub risk_level: RiskLevel,
    pub required_min_confidence: f64,
    pub max_safe_position_usd: f64,
    pub reasons: Vec<String>,
}

/// Rolling risk metrics recomputed from the trade history ring buffer after
/// every trade. Exposure maps track notional traded per token/chain over the
/// trailing 24h: trades here settle atomically (flash-loan style, same
/// block) so there's no persistent open position to sum — the maps instead
/// approximate concentration risk as a rolling day of volume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskMetrics {
    pub consecutive_failures: u32,
    pub consecutive_successes: u32,
    pub peak_capital_usd: f64,
    pub current_capital_usd: f64,
    pub daily_pnl_usd: f64,
    pub weekly_pnl_usd: f64,
    pub total_gas_spent_usd: f64,
    pub total_realized_profit_usd: f64,
    pub success_rate_1h: f64,
    pub success_rate_24h: f64,
    /// Average of net/gross return over profitable trades only.
    pub average_profit_margin: f64,
    /// Sum of gas cost over the last `gas_ratio_window` trades, divided by
    /// current capital — the breaker's gas-to-*capital* trip condition.
    pub gas_to_capital_ratio_20: f64,
    pub exposure_by_token_usd: HashMap<Address, f64>,
    pub exposure_by_chain_usd: HashMap<u64, f64>,
    pub last_trip_at: Option<DateTime<Utc>>,
}

impl RiskMetrics {
    pub fn new(starting_capital_usd: f64) -> Self {
        Self {
            consecutive_failures: 0,
            consecutive_successes: 0,
            peak_capital_usd: starting_capital_usd,
            current_capital_usd: starting_capital_usd,
            daily_pnl_usd: 0.0,
            weekly_pnl_usd: 0.0,
            total_gas_spent_usd: 0.0,
            total_realized_profit_usd: 0.0,
            success_rate_1h: 1.0,
            success_rate_24h: 1.0,
            average_profit_margin: 0.0,
            gas_to_capital_ratio_20: 0.0,
            exposure_by_token_usd: HashMap::new(),
            exposure_by_chain_usd: HashMap::new(),
            last_trip_at: None,
        }
    }

    /// `(peak - current) / peak`: a point-in-time pullback from the running
    /// peak, not an all-time max-drawdown statistic.
    pub fn current_drawdown(&self) -> f64 {
        if self.peak_capital_usd <= 0.0 {
            0.0
        } else {
            ((self.peak_capital_usd - self.current_capital_usd) / self.peak_capital_usd).max(0.0)
        }
    }

    /// Cumulative gas spend over cumulative realized profit — distinct from
    /// `gas_to_capital_ratio_20`, which is the breaker's trailing-window,
    /// capital-denominated ratio.
    pub fn gas_to_profit_ratio(&self) -> f64 {
        if self.total_realized_profit_usd <= 0.0 {
            if self.total_gas_spent_usd > 0.0 {
                f64::INFINITY
            } else {
                0.0
            }
        } else {
            self.total_gas_spent_usd / self.total_realized_profit_usd
        }
    }
}
