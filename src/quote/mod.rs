pub mod engine;

pub use engine::{Quote, QuoteEngine};
