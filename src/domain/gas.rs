use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

/// Gas pricing for one submission attempt. Kept in wei (`U256`) end to end;
/// only the final "should we execute" decision touches `f64` ratios.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GasSettings {
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
    pub gas_limit: u64,
    /// Estimated L1 data-posting cost in wei, for rollups that charge it
    /// separately from L2 execution gas (both Arbitrum and Optimism do,
    /// via different fee models — see `gas::pricer`).
    pub l1_data_cost_wei: U256,
}

impl GasSettings {
    pub fn total_cost_wei(&self) -> U256 {
        U256::from(self.gas_limit)
            .saturating_mul(self.max_fee_per_gas)
            .saturating_add(self.l1_data_cost_wei)
    }
}
