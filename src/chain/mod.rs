pub mod gateway;
pub mod retry;

pub use gateway::{ChainGateway, FeeEstimate};
pub use retry::{with_retry, RetryPolicy};
