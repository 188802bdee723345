pub mod universe;

pub use universe::TokenUniverse;
