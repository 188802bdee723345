use super::router::Router;
use super::token::Token;
use crate::error::CoreError;

/// A concrete route: `tokens.len() - 1 == routers.len()`, each `routers[i]`
/// swapping `tokens[i] -> tokens[i+1]`.
#[derive(Debug, Clone)]
pub struct Path {
    pub tokens: Vec<Token>,
    pub routers: Vec<Router>,
    /// Sum of per-edge Bellman-Ford weights; negative means profitable.
    pub total_weight: f64,
}

impl Path {
    pub fn new(tokens: Vec<Token>, routers: Vec<Router>, total_weight: f64) -> Result<Self, CoreError> {
        if tokens.len() < 2 {
            return Err(CoreError::ConfigInvalid(
                "path must contain at least two tokens".into(),
            ));
        }
        if routers.len() != tokens.len() - 1 {
            return Err(CoreError::ConfigInvalid(format!(
                "path has {} tokens but {} routers; expected {}",
                tokens.len(),
                routers.len(),
                tokens.len() - 1
            )));
        }
        Ok(Self {
            tokens,
            routers,
            total_weight,
        })
    }

    pub fn hop_count(&self) -> usize {
        self.routers.len()
    }

    pub fn is_cycle(&self) -> bool {
        self.tokens.first().map(|t| &t.address) == self.tokens.last().map(|t| &t.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::router::RouterKind;
    use alloy::primitives::Address;

    fn token(n: u8) -> Token {
        Token {
            address: Address::repeat_byte(n),
            symbol: format!("T{n}"),
            decimals: 18,
            chain_id: 42161,
            volatility: 0.0,
            reference_price_usd: None,
        }
    }

    fn router() -> Router {
        Router {
            kind: RouterKind::V2Amm,
            name: "r".into(),
            chain_id: 42161,
            address: Address::ZERO,
            factory: None,
            fee_tiers_bps: vec![],
            liquidity_score: 1.0,
        }
    }

    #[test]
    fn rejects_mismatched_hop_count() {
        let err = Path::new(vec![token(1), token(2), token(3)], vec![router()], 0.0);
        assert!(err.is_err());
    }

    #[test]
    fn detects_cycle() {
        let path = Path::new(
            vec![token(1), token(2), token(1)],
            vec![router(), router()],
            -0.01,
        )
        .unwrap();
        assert!(path.is_cycle());
    }
}
