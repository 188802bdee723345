//! Oracle Validator: cross-checks a DEX-derived price against an external
//! reference feed before an opportunity is trusted, catching stale or
//! manipulated pool state that a gas/profit check alone wouldn't.
//!
//! Caches the fetched reference price behind a TTL so validating several
//! candidates that share a token in one scan doesn't refetch it each time.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use alloy::primitives::Address;
use async_trait::async_trait;

use crate::error::CoreError;

const CACHE_TTL: Duration = Duration::from_secs(30);
const LARGE_TRADE_USD: f64 = 10_000.0;
const CAUTION_DEVIATION: f64 = 0.01; // 1%
const REJECT_DEVIATION: f64 = 0.02; // 2%

#[async_trait]
pub trait ReferencePriceSource: Send + Sync {
    async fn price_usd(&self, token: Address) -> Result<f64, CoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    Accept,
    Caution,
    Reject,
}

#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub manipulation_score: f64,
    pub recommendation: Recommendation,
    pub warnings: Vec<String>,
}

pub struct OracleValidator {
    source: Box<dyn ReferencePriceSource>,
    cache: RwLock<HashMap<Address, (f64, Instant)>>,
}

impl OracleValidator {
    pub fn new(source: Box<dyn ReferencePriceSource>) -> Self {
        Self {
            source,
            cache: RwLock::new(HashMap::new()),
        }
    }

    async fn reference_price(&self, token: Address) -> Option<f64> {
        if let Some((price, fetched_at)) = self
            .cache
            .read()
            .expect("oracle cache lock poisoned")
            .get(&token)
            .copied()
        {
            if fetched_at.elapsed() < CACHE_TTL {
                return Some(price);
            }
        }
        match self.source.price_usd(token).await {
            Ok(price) => {
                self.cache
                    .write()
                    .expect("oracle cache lock poisoned")
                    .insert(token, (price, Instant::now()));
                Some(price)
            }
            Err(_) => None,
        }
    }

    pub async fn validate(
        &self,
        token: Address,
        dex_price_usd: f64,
        trade_size_usd: f64,
    ) -> ValidationResult {
        let Some(reference) = self.reference_price(token).await else {
            // No reference available: never silently accept a large trade
            // on DEX-only pricing, however good it looks.
            return if trade_size_usd > LARGE_TRADE_USD {
                ValidationResult {
                    is_valid: false,
                    manipulation_score: 0.0,
                    recommendation: Recommendation::Caution,
                    warnings: vec!["no reference price available for a large trade".into()],
                }
            } else {
                ValidationResult {
                    is_valid: true,
                    manipulation_score: 0.0,
                    recommendation: Recommendation::Accept,
                    warnings: vec!["no reference price available".into()],
                }
            };
        };

        let deviation = if reference > 0.0 {
            (dex_price_usd - reference).abs() / reference
        } else {
            1.0
        };
        let manipulation_score = (deviation / REJECT_DEVIATION).min(1.0);

        let (is_valid, recommendation, mut warnings) = if deviation >= REJECT_DEVIATION {
            (false, Recommendation::Reject, vec![format!(
                "price deviates {:.2}% from reference, exceeds reject threshold",
                deviation * 100.0
            )])
        } else if deviation >= CAUTION_DEVIATION {
            (true, Recommendation::Caution, vec![format!(
                "price deviates {:.2}% from reference",
                deviation * 100.0
            )])
        } else {
            (true, Recommendation::Accept, Vec::new())
        };

        if trade_size_usd > LARGE_TRADE_USD && recommendation == Recommendation::Caution {
            warnings.push("large trade size compounds the caution flag".into());
        }

        ValidationResult {
            is_valid,
            manipulation_score,
            recommendation,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSource(f64);

    #[async_trait]
    impl ReferencePriceSource for FixedSource {
        async fn price_usd(&self, _token: Address) -> Result<f64, CoreError> {
            Ok(self.0)
        }
    }

    struct FailingSource;

    #[async_trait]
    impl ReferencePriceSource for FailingSource {
        async fn price_usd(&self, _token: Address) -> Result<f64, CoreError> {
            Err(CoreError::Timeout { elapsed_ms: 5000 })
        }
    }

    #[tokio::test]
    async fn accepts_price_close_to_reference() {
        let validator = OracleValidator::new(Box::new(FixedSource(100.0)));
        let result = validator.validate(Address::ZERO, 100.2, 50.0).await;
        assert_eq!(result.recommendation, Recommendation::Accept);
    }

    #[tokio::test]
    async fn rejects_large_deviation() {
        let validator = OracleValidator::new(Box::new(FixedSource(100.0)));
        let result = validator.validate(Address::ZERO, 120.0, 50.0).await;
        assert_eq!(result.recommendation, Recommendation::Reject);
        assert!(!result.is_valid);
    }

    #[tokio::test]
    async fn never_accepts_large_trade_without_reference() {
        let validator = OracleValidator::new(Box::new(FailingSource));
        let result = validator.validate(Address::ZERO, 100.0, 50_000.0).await;
        assert_eq!(result.recommendation, Recommendation::Caution);
        assert!(!result.is_valid);
    }
}
