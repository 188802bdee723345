//! Risk Manager: owns the only mutable trading-safety state in the
//! process. Armed -> Tripped -> CoolingDown -> Armed, gated on consecutive
//! failures, P&L drawdown and loss windows, success rate, and gas-cost
//! ratios. A separate per-trade gate (`assess_trade_risk`) runs ahead of
//! every submission regardless of breaker phase, sizing and rejecting
//! individual trades on concentration and gas-to-profit grounds.
//!
//! The bounded trade-history ring buffer keeps the last N entries, trimming
//! in bulk via `drain` rather than a per-push `Vec::remove(0)` so trimming
//! stays O(1) amortized instead of O(n) per trade. Every other metric is
//! recomputed from that buffer on each update; history sizes here (tens of
//! thousands of trades at most) make an O(n) rescan per trade cheap enough
//! that keeping a second set of incrementally-updated counters isn't worth
//! the bookkeeping risk of the two drifting apart.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use alloy::primitives::Address;
use chrono::{DateTime, Duration as ChronoDuration, Utc};

use crate::domain::risk::{
    BreakerPhase, CircuitBreakerState, RiskLevel, RiskMetrics, TradeRiskAssessment,
};
use crate::domain::trade::TradeRecord;
use crate::error::CoreError;

const MAX_HISTORY: usize = 10_000;
const TRIM_TO: usize = 5_000;

#[derive(Debug, Clone, Copy)]
pub struct RiskConfig {
    pub max_consecutive_failures: u32,
    /// Point-in-time pullback from the running equity peak.
    pub max_drawdown: f64,
    pub max_daily_loss_fraction: f64,
    pub max_weekly_loss_fraction: f64,
    pub min_hourly_success_rate: f64,
    /// Success-rate trip only applies once at least this many trades exist.
    pub min_trades_for_success_rate: u32,
    /// Breaker trip: trailing gas spend over current capital.
    pub max_gas_to_capital_ratio: f64,
    pub gas_ratio_window: usize,
    pub cooldown: Duration,
    pub starting_equity_usd: f64,
    /// Per-trade gate: trade size as a fraction of capital.
    pub max_trade_size_fraction_of_capital: f64,
    /// Per-trade gate: this trade's gas cost over its own expected profit.
    pub max_gas_to_profit_ratio: f64,
    pub max_chain_exposure_fraction: f64,
    pub max_token_exposure_fraction: f64,
    pub recovery_drawdown_factor: f64,
    pub recovery_min_trades: u32,
    pub recovery_success_rate_factor: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_consecutive_failures: 5,
            max_drawdown: 0.05,
            max_daily_loss_fraction: 0.08,
            max_weekly_loss_fraction: 0.15,
            min_hourly_success_rate: 0.15,
            min_trades_for_success_rate: 20,
            max_gas_to_capital_ratio: 0.25,
            gas_ratio_window: 20,
            cooldown: Duration::from_secs(1_800),
            starting_equity_usd: 0.0,
            max_trade_size_fraction_of_capital: 0.15,
            max_gas_to_profit_ratio: 0.25,
            max_chain_exposure_fraction: 0.40,
            max_token_exposure_fraction: 0.25,
            recovery_drawdown_factor: 0.7,
            recovery_min_trades: 10,
            recovery_success_rate_factor: 1.2,
        }
    }
}

pub struct RiskManager {
    config: RiskConfig,
    metrics: RiskMetrics,
    breaker: CircuitBreakerState,
    history: VecDeque<TradeRecord>,
}

impl RiskManager {
    pub fn new(config: RiskConfig) -> Self {
        Self {
            metrics: RiskMetrics::new(config.starting_equity_usd),
            config,
            breaker: CircuitBreakerState::armed(),
            history: VecDeque::new(),
        }
    }

    pub fn state(&self) -> CircuitBreakerState {
        self.breaker.clone()
    }

    pub fn metrics(&self) -> &RiskMetrics {
        &self.metrics
    }

    /// Gate checked before a bundle is built: returns an error describing
    /// why execution is refused, or `Ok(())` when armed (or cooling down
    /// and willing to admit a probe trade).
    pub fn check_gate(&mut self) -> Result<(), CoreError> {
        self.maybe_recover();
        match self.breaker.phase {
            BreakerPhase::Armed | BreakerPhase::CoolingDown => Ok(()),
            BreakerPhase::Tripped => Err(CoreError::CircuitBreakerTripped),
        }
    }

    /// Manually re-arm a tripped breaker, when permitted. Trips caused by
    /// drawdown or P&L loss windows never allow an override.
    pub fn override_breaker(&mut self) -> Result<(), CoreError> {
        if self.breaker.phase != BreakerPhase::Tripped {
            return Ok(());
        }
        if !self.breaker.override_allowed {
            return Err(CoreError::CircuitBreakerTripped);
        }
        self.breaker = CircuitBreakerState::armed();
        Ok(())
    }

    /// Per-trade gate, run ahead of every submission independent of the
    /// breaker's own cumulative trip conditions. Checks trade size, this
    /// trade's gas-to-profit ratio, and chain/token concentration against
    /// current capital, and returns the risk level and position headroom
    /// that survive when the trade clears.
    pub fn assess_trade_risk(
        &self,
        trade_size_usd: f64,
        gas_cost_usd: f64,
        expected_profit_usd: f64,
        token: Address,
        chain_id: u64,
    ) -> TradeRiskAssessment {
        if self.breaker.is_tripped() {
            return TradeRiskAssessment {
                approved: false,
                risk_level: RiskLevel::Critical,
                required_min_confidence: RiskLevel::Critical.minimum_confidence(),
                max_safe_position_usd: 0.0,
                reasons: vec!["Trading paused".into()],
            };
        }

        let capital = self.metrics.current_capital_usd.max(0.0);
        let chain_exposure = self
            .metrics
            .exposure_by_chain_usd
            .get(&chain_id)
            .copied()
            .unwrap_or(0.0);
        let token_exposure = self
            .metrics
            .exposure_by_token_usd
            .get(&token)
            .copied()
            .unwrap_or(0.0);

        let mut reasons = Vec::new();

        if capital > 0.0 && trade_size_usd > capital * self.config.max_trade_size_fraction_of_capital {
            reasons.push(format!(
                "Trade size too large: {:.1}% > {:.1}% of capital",
                (trade_size_usd / capital) * 100.0,
                self.config.max_trade_size_fraction_of_capital * 100.0
            ));
        }

        if expected_profit_usd > 0.0 {
            let ratio = gas_cost_usd / expected_profit_usd;
            if ratio > self.config.max_gas_to_profit_ratio {
                reasons.push(format!(
                    "Gas ratio too high: {:.0}% > {:.0}%",
                    ratio * 100.0,
                    self.config.max_gas_to_profit_ratio * 100.0
                ));
            }
        }

        if capital > 0.0
            && chain_exposure + trade_size_usd > capital * self.config.max_chain_exposure_fraction
        {
            reasons.push(format!(
                "Chain exposure too high: {:.1}% > {:.1}% of capital",
                ((chain_exposure + trade_size_usd) / capital) * 100.0,
                self.config.max_chain_exposure_fraction * 100.0
            ));
        }

        if capital > 0.0 && token_exposure > capital * self.config.max_token_exposure_fraction {
            reasons.push(format!(
                "Token exposure too high: {:.1}% > {:.1}% of capital",
                (token_exposure / capital) * 100.0,
                self.config.max_token_exposure_fraction * 100.0
            ));
        }

        let max_safe_position_usd = self.max_safe_position_usd(chain_exposure, token_exposure, capital);

        if !reasons.is_empty() {
            return TradeRiskAssessment {
                approved: false,
                risk_level: RiskLevel::High,
                required_min_confidence: RiskLevel::High.minimum_confidence(),
                max_safe_position_usd,
                reasons,
            };
        }

        let risk_level = self.graduated_risk_level(
            trade_size_usd,
            gas_cost_usd,
            expected_profit_usd,
            chain_exposure,
            token_exposure,
            capital,
        );
        TradeRiskAssessment {
            approved: true,
            risk_level,
            required_min_confidence: risk_level.minimum_confidence(),
            max_safe_position_usd,
            reasons: Vec::new(),
        }
    }

    fn max_safe_position_usd(&self, chain_exposure: f64, token_exposure: f64, capital: f64) -> f64 {
        if capital <= 0.0 {
            return 0.0;
        }
        let from_trade_cap = capital * self.config.max_trade_size_fraction_of_capital;
        let from_chain = (capital * self.config.max_chain_exposure_fraction - chain_exposure).max(0.0);
        let from_token = (capital * self.config.max_token_exposure_fraction - token_exposure).max(0.0);
        from_trade_cap.min(from_chain).min(from_token)
    }

    fn graduated_risk_level(
        &self,
        trade_size_usd: f64,
        gas_cost_usd: f64,
        expected_profit_usd: f64,
        chain_exposure: f64,
        token_exposure: f64,
        capital: f64,
    ) -> RiskLevel {
        if capital <= 0.0 {
            return RiskLevel::Medium;
        }
        let trade_utilization =
            trade_size_usd / (capital * self.config.max_trade_size_fraction_of_capital);
        let gas_utilization = if expected_profit_usd > 0.0 {
            (gas_cost_usd / expected_profit_usd) / self.config.max_gas_to_profit_ratio
        } else {
            0.0
        };
        let chain_utilization = (chain_exposure + trade_size_usd)
            / (capital * self.config.max_chain_exposure_fraction);
        let token_utilization = token_exposure / (capital * self.config.max_token_exposure_fraction);

        let worst = [trade_utilization, gas_utilization, chain_utilization, token_utilization]
            .into_iter()
            .fold(0.0_f64, f64::max);

        if worst >= 0.7 {
            RiskLevel::High
        } else if worst >= 0.4 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// Feeds one completed execution outcome in and re-evaluates every trip
    /// condition. Call this the moment a `TradeRecord` is produced.
    pub fn update_and_check(&mut self, record: TradeRecord) {
        let just_succeeded = record.success;
        self.push_history(record);
        self.recompute_metrics();

        if self.breaker.phase == BreakerPhase::CoolingDown && just_succeeded {
            self.breaker = CircuitBreakerState::armed();
        }

        if self.breaker.phase != BreakerPhase::Tripped {
            let reasons = self.evaluate_trip_conditions();
            if !reasons.is_empty() {
                self.trip(reasons);
            }
        }

        self.maybe_recover();
    }

    fn evaluate_trip_conditions(&self) -> Vec<String> {
        let mut reasons = Vec::new();
        let capital = self.metrics.current_capital_usd.max(0.0);

        let drawdown = self.metrics.current_drawdown();
        if drawdown > self.config.max_drawdown {
            reasons.push(format!(
                "Drawdown too high: {:.1}% > {:.1}%",
                drawdown * 100.0,
                self.config.max_drawdown * 100.0
            ));
        }

        if capital > 0.0 {
            let daily_loss_fraction = (-self.metrics.daily_pnl_usd / capital).max(0.0);
            if daily_loss_fraction > self.config.max_daily_loss_fraction {
                reasons.push(format!(
                    "Daily loss too high: {:.1}% > {:.1}%",
                    daily_loss_fraction * 100.0,
                    self.config.max_daily_loss_fraction * 100.0
                ));
            }

            let weekly_loss_fraction = (-self.metrics.weekly_pnl_usd / capital).max(0.0);
            if weekly_loss_fraction > self.config.max_weekly_loss_fraction {
                reasons.push(format!(
                    "Weekly loss too high: {:.1}% > {:.1}%",
                    weekly_loss_fraction * 100.0,
                    self.config.max_weekly_loss_fraction * 100.0
                ));
            }
        }

        if self.metrics.consecutive_failures >= self.config.max_consecutive_failures {
            reasons.push(format!(
                "Too many consecutive failures: {}",
                self.metrics.consecutive_failures
            ));
        }

        let total_trades = self.history.len() as u32;
        if total_trades >= self.config.min_trades_for_success_rate
            && self.metrics.success_rate_1h < self.config.min_hourly_success_rate
        {
            reasons.push(format!(
                "Success rate too low: {:.1}% < {:.1}% (over {} trades)",
                self.metrics.success_rate_1h * 100.0,
                self.config.min_hourly_success_rate * 100.0,
                total_trades
            ));
        }

        if self.metrics.gas_to_capital_ratio_20 > self.config.max_gas_to_capital_ratio {
            reasons.push(format!(
                "Gas-to-capital ratio too high: {:.1}% > {:.1}%",
                self.metrics.gas_to_capital_ratio_20 * 100.0,
                self.config.max_gas_to_capital_ratio * 100.0
            ));
        }

        reasons
    }

    fn trip(&mut self, reasons: Vec<String>) {
        let now = Utc::now();
        // P&L-driven trips (drawdown, daily/weekly loss) reflect genuine
        // capital damage and require a human look; failure-rate or
        // gas-ratio trips are transient and safe to override once
        // acknowledged.
        let override_allowed = !reasons.iter().any(|r| {
            r.starts_with("Drawdown") || r.starts_with("Daily loss") || r.starts_with("Weekly loss")
        });
        self.breaker = CircuitBreakerState {
            phase: BreakerPhase::Tripped,
            active: true,
            activated_at: Some(now),
            reasons,
            resume_at: Some(now + chrono_duration_from_std(self.config.cooldown)),
            override_allowed,
        };
        self.metrics.last_trip_at = Some(now);
    }

    fn maybe_recover(&mut self) {
        if self.breaker.phase != BreakerPhase::Tripped {
            return;
        }
        let Some(resume_at) = self.breaker.resume_at else {
            return;
        };
        if Utc::now() < resume_at {
            return;
        }
        let drawdown_ok =
            self.metrics.current_drawdown() < self.config.recovery_drawdown_factor * self.config.max_drawdown;
        let total_trades = self.history.len() as u32;
        let success_rate_ok = total_trades < self.config.recovery_min_trades
            || self.metrics.success_rate_1h
                > self.config.recovery_success_rate_factor * self.config.min_hourly_success_rate;

        if self.metrics.consecutive_failures == 0 && drawdown_ok && success_rate_ok {
            self.breaker = CircuitBreakerState {
                phase: BreakerPhase::CoolingDown,
                active: true,
                activated_at: self.breaker.activated_at,
                reasons: self.breaker.reasons.clone(),
                resume_at: None,
                override_allowed: self.breaker.override_allowed,
            };
        }
    }

    fn recompute_metrics(&mut self) {
        let now = Utc::now();
        let one_hour_ago = now - ChronoDuration::hours(1);
        let one_day_ago = now - ChronoDuration::hours(24);
        let one_week_ago = now - ChronoDuration::days(7);

        let mut equity = self.config.starting_equity_usd;
        let mut peak = equity;
        for record in &self.history {
            equity += record.net_usd();
            if equity > peak {
                peak = equity;
            }
        }
        self.metrics.current_capital_usd = equity;
        self.metrics.peak_capital_usd = peak;

        let mut consecutive_failures = 0;
        let mut consecutive_successes = 0;
        for record in self.history.iter().rev() {
            if record.success {
                if consecutive_failures > 0 {
                    break;
                }
                consecutive_successes += 1;
            } else {
                if consecutive_successes > 0 {
                    break;
                }
                consecutive_failures += 1;
            }
        }
        self.metrics.consecutive_failures = consecutive_failures;
        self.metrics.consecutive_successes = consecutive_successes;

        self.metrics.daily_pnl_usd = self
            .history
            .iter()
            .filter(|r| r.submitted_at >= one_day_ago)
            .map(|r| r.net_usd())
            .sum();
        self.metrics.weekly_pnl_usd = self
            .history
            .iter()
            .filter(|r| r.submitted_at >= one_week_ago)
            .map(|r| r.net_usd())
            .sum();

        let hourly: Vec<&TradeRecord> = self
            .history
            .iter()
            .filter(|r| r.submitted_at >= one_hour_ago)
            .collect();
        self.metrics.success_rate_1h = success_rate(&hourly);
        let daily: Vec<&TradeRecord> = self
            .history
            .iter()
            .filter(|r| r.submitted_at >= one_day_ago)
            .collect();
        self.metrics.success_rate_24h = success_rate(&daily);

        let window = self.config.gas_ratio_window.max(1);
        let recent_gas: f64 = self.history.iter().rev().take(window).map(|r| r.gas_cost_usd).sum();
        self.metrics.gas_to_capital_ratio_20 = if self.metrics.current_capital_usd > 0.0 {
            recent_gas / self.metrics.current_capital_usd
        } else if recent_gas > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let profitable: Vec<&TradeRecord> = self
            .history
            .iter()
            .filter(|r| r.realized_profit_usd > 0.0)
            .collect();
        self.metrics.average_profit_margin = if profitable.is_empty() {
            0.0
        } else {
            profitable.iter().map(|r| r.net_usd() / r.realized_profit_usd).sum::<f64>()
                / profitable.len() as f64
        };

        self.metrics.total_gas_spent_usd = self.history.iter().map(|r| r.gas_cost_usd).sum();
        self.metrics.total_realized_profit_usd = self
            .history
            .iter()
            .filter(|r| r.success)
            .map(|r| r.realized_profit_usd)
            .sum();

        let mut by_token: HashMap<Address, f64> = HashMap::new();
        let mut by_chain: HashMap<u64, f64> = HashMap::new();
        for record in self.history.iter().filter(|r| r.submitted_at >= one_day_ago) {
            *by_token.entry(record.token).or_insert(0.0) += record.trade_size_usd;
            *by_chain.entry(record.chain_id).or_insert(0.0) += record.trade_size_usd;
        }
        self.metrics.exposure_by_token_usd = by_token;
        self.metrics.exposure_by_chain_usd = by_chain;
    }

    fn push_history(&mut self, record: TradeRecord) {
        self.history.push_back(record);
        if self.history.len() > MAX_HISTORY {
            let excess = self.history.len() - TRIM_TO;
            self.history.drain(0..excess);
        }
    }

    pub fn history(&self) -> &VecDeque<TradeRecord> {
        &self.history
    }
}

fn success_rate(records: &[&TradeRecord]) -> f64 {
    if records.is_empty() {
        return 1.0;
    }
    let successes = records.iter().filter(|r| r.success).count();
    successes as f64 / records.len() as f64
}

fn chrono_duration_from_std(d: Duration) -> ChronoDuration {
    ChronoDuration::from_std(d).unwrap_or_else(|_| ChronoDuration::zero())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Address, I256, U256};

    fn success_record(profit_usd: f64) -> TradeRecord {
        TradeRecord {
            opportunity_id: "o".into(),
            chain_id: 42161,
            token: Address::repeat_byte(1),
            trade_size_usd: 1_000.0,
            tx_hash: None,
            submitted_at: Utc::now(),
            success: true,
            realized_profit: I256::try_from(1_i64).unwrap(),
            realized_profit_usd: profit_usd,
            gas_used: U256::from(100_000u64),
            gas_cost_usd: 0.5,
            error: None,
        }
    }

    fn failure_record() -> TradeRecord {
        TradeRecord {
            opportunity_id: "o".into(),
            chain_id: 42161,
            token: Address::repeat_byte(1),
            trade_size_usd: 1_000.0,
            tx_hash: None,
            submitted_at: Utc::now(),
            success: false,
            realized_profit: I256::try_from(-1_i64).unwrap(),
            realized_profit_usd: -1.0,
            gas_used: U256::from(100_000u64),
            gas_cost_usd: 0.5,
            error: Some("reverted".into()),
        }
    }

    #[test]
    fn trips_after_consecutive_failures() {
        let mut manager = RiskManager::new(RiskConfig {
            max_consecutive_failures: 3,
            ..Default::default()
        });
        for _ in 0..3 {
            manager.update_and_check(failure_record());
        }
        assert!(manager.state().is_tripped());
        assert!(manager
            .state()
            .reasons
            .iter()
            .any(|r| r == "Too many consecutive failures: 3"));
        assert!(manager.check_gate().is_err());
    }

    #[test]
    fn success_resets_consecutive_failure_count() {
        let mut manager = RiskManager::new(RiskConfig::default());
        manager.update_and_check(failure_record());
        manager.update_and_check(failure_record());
        manager.update_and_check(success_record(5.0));
        assert_eq!(manager.metrics().consecutive_failures, 0);
    }

    #[test]
    fn history_is_bounded() {
        let mut manager = RiskManager::new(RiskConfig {
            max_consecutive_failures: 1_000_000,
            ..Default::default()
        });
        for _ in 0..(MAX_HISTORY + 10) {
            manager.update_and_check(success_record(0.01));
        }
        assert!(manager.history().len() <= MAX_HISTORY);
    }

    #[test]
    fn per_trade_gate_rejects_oversized_trade() {
        let manager = RiskManager::new(RiskConfig {
            starting_equity_usd: 1_000.0,
            ..Default::default()
        });
        let assessment =
            manager.assess_trade_risk(200.0, 1.0, 50.0, Address::repeat_byte(1), 42161);
        assert!(!assessment.approved);
        assert!(assessment.reasons.iter().any(|r| r.starts_with("Trade size too large")));
    }

    #[test]
    fn per_trade_gate_approves_small_trade_with_low_risk() {
        let manager = RiskManager::new(RiskConfig {
            starting_equity_usd: 10_000.0,
            ..Default::default()
        });
        let assessment =
            manager.assess_trade_risk(100.0, 1.0, 50.0, Address::repeat_byte(1), 42161);
        assert!(assessment.approved);
        assert_eq!(assessment.risk_level, RiskLevel::Low);
    }
}
