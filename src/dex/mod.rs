pub mod registry;

pub use registry::DexRegistry;
