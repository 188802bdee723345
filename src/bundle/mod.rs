pub mod builder;
pub mod cooldown;
pub mod relay;

pub use builder::{BundleBuilder, RankedCandidate};
pub use cooldown::RouteCooldown;
pub use relay::{Bundle, BundleReceipt, RelayClient, SimulationOutcome};
