use alloy::primitives::{Address, TxHash, I256, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one submitted (or simulated) execution attempt. Round-trips
/// through JSON losslessly — this is the shape persisted to the NDJSON
/// report file and fed back into the Risk Manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub opportunity_id: String,
    pub chain_id: u64,
    /// Input token of the trade, carried through for the Risk Manager's
    /// per-token exposure tracking.
    pub token: Address,
    /// Notional size of the trade in USD, for exposure and gate sizing.
    pub trade_size_usd: f64,
    pub tx_hash: Option<TxHash>,
    pub submitted_at: DateTime<Utc>,
    pub success: bool,
    pub realized_profit: I256,
    pub realized_profit_usd: f64,
    pub gas_used: U256,
    pub gas_cost_usd: f64,
    pub error: Option<String>,
}

impl TradeRecord {
    pub fn net_usd(&self) -> f64 {
        self.realized_profit_usd - self.gas_cost_usd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let record = TradeRecord {
            opportunity_id: "opp-1".into(),
            chain_id: 42161,
            token: Address::ZERO,
            trade_size_usd: 500.0,
            tx_hash: None,
            submitted_at: Utc::now(),
            success: true,
            realized_profit: I256::try_from(1_000_i64).unwrap(),
            realized_profit_usd: 12.5,
            gas_used: U256::from(210_000u64),
            gas_cost_usd: 0.8,
            error: None,
        };
        let encoded = serde_json::to_string(&record).unwrap();
        let decoded: TradeRecord = serde_json::from_str(&encoded).unwrap();
        assert_eq!(record, decoded);
    }
}
