//! Core domain types shared by every component.
//!
//! Money and gas amounts are `alloy` wide integers (`U256` unsigned,
//! `I256` signed for P&L) per the no-floats-for-balances rule; `f64` is
//! reserved for ratios, scores, and probabilities (rates, confidence,
//! congestion multipliers, volatility).

pub mod edge;
pub mod gas;
pub mod opportunity;
pub mod path;
pub mod risk;
pub mod router;
pub mod token;
pub mod trade;

pub use edge::Edge;
pub use gas::GasSettings;
pub use opportunity::{Complexity, LegacyOpportunity, Opportunity};
pub use path::Path;
pub use risk::{BreakerPhase, CircuitBreakerState, RiskLevel, RiskMetrics, TradeRiskAssessment};
pub use router::{Router, RouterKind};
pub use token::Token;
pub use trade::TradeRecord;
