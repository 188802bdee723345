pub mod pricer;

pub use pricer::{Chain, Congestion, GasPricer, Urgency};
