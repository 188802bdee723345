use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

/// Tagged router kind.
///
/// A trait object (`dyn Router`) was considered and rejected: each kind has
/// a genuinely different call signature (V2's `getAmountsOut`, V3's
/// tick-based quoter, Curve's `get_dy`, Balancer's vault query) and the
/// quote engine needs to match on kind anyway to pick the right ABI. A
/// closed enum keeps that dispatch exhaustive and visible at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RouterKind {
    V2Amm,
    V3Amm,
    StableCurve,
    WeightedPool,
    PerpSpot,
}

impl RouterKind {
    pub fn atomic_fee_fraction(self, fee_bps: u32) -> f64 {
        match self {
            RouterKind::V2Amm => 0.003,
            RouterKind::V3Amm => fee_bps as f64 / 1_000_000.0,
            RouterKind::StableCurve => 0.0004,
            RouterKind::WeightedPool => 0.002,
            RouterKind::PerpSpot => 0.0005,
        }
    }

    pub fn is_v3(self) -> bool {
        matches!(self, RouterKind::V3Amm)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Router {
    pub kind: RouterKind,
    pub name: String,
    pub chain_id: u64,
    pub address: Address,
    /// Factory/registry contract used to look up pools, when applicable.
    pub factory: Option<Address>,
    /// Declared V3 fee tiers in basis points (ignored for non-V3 kinds).
    pub fee_tiers_bps: Vec<u32>,
    /// Rough liquidity score in `[0, 1]` used for path scoring and
    /// registry coverage stats.
    pub liquidity_score: f64,
}

impl Router {
    pub fn default_fee_tier(&self) -> u32 {
        self.fee_tiers_bps.first().copied().unwrap_or(3000)
    }

    pub fn fallback_fee_tier(&self) -> Option<u32> {
        self.fee_tiers_bps.get(1).copied()
    }
}
