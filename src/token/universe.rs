//! Token Universe: the set of tokens the Pathfinder builds a graph over.
//! Replaced wholesale on each refresh via an atomic snapshot swap (clone an
//! `Arc`, swap the pointer) so readers never observe a half-updated list.

use std::sync::{Arc, RwLock};

use crate::domain::token::Token;

pub struct TokenUniverse {
    snapshot: RwLock<Arc<[Token]>>,
    high_volatility_threshold: f64,
}

impl TokenUniverse {
    pub fn new(initial: Vec<Token>, high_volatility_threshold: f64) -> Self {
        Self {
            snapshot: RwLock::new(Arc::from(initial)),
            high_volatility_threshold,
        }
    }

    /// Atomically replaces the tracked token set. Readers holding an old
    /// `Arc` from `snapshot()` keep seeing a consistent (if stale) view.
    pub fn replace(&self, tokens: Vec<Token>) {
        let mut guard = self.snapshot.write().expect("token universe lock poisoned");
        *guard = Arc::from(tokens);
    }

    pub fn snapshot(&self) -> Arc<[Token]> {
        Arc::clone(&self.snapshot.read().expect("token universe lock poisoned"))
    }

    pub fn high_volatility_pairs(&self) -> Vec<Token> {
        self.snapshot()
            .iter()
            .filter(|t| t.is_high_volatility(self.high_volatility_threshold))
            .cloned()
            .collect()
    }

    /// The base universe plus any token that appears as a counterparty of a
    /// high-volatility token in at least one known router's pool — used by
    /// the Pathfinder to widen the graph around active tokens without
    /// scanning every long-tail token on chain.
    pub fn expanded_universe(&self, extra: Vec<Token>) -> Vec<Token> {
        let mut all: Vec<Token> = self.snapshot().to_vec();
        for token in extra {
            if !all.iter().any(|t| t.address == token.address) {
                all.push(token);
            }
        }
        all
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::Address;

    fn token(n: u8, volatility: f64) -> Token {
        Token {
            address: Address::repeat_byte(n),
            symbol: format!("T{n}"),
            decimals: 18,
            chain_id: 42161,
            volatility,
            reference_price_usd: None,
        }
    }

    #[test]
    fn replace_is_visible_to_new_snapshots() {
        let universe = TokenUniverse::new(vec![token(1, 0.1)], 0.5);
        assert_eq!(universe.len(), 1);
        universe.replace(vec![token(1, 0.1), token(2, 0.9)]);
        assert_eq!(universe.len(), 2);
    }

    #[test]
    fn high_volatility_pairs_respects_threshold() {
        let universe = TokenUniverse::new(vec![token(1, 0.1), token(2, 0.9)], 0.5);
        let hot = universe.high_volatility_pairs();
        assert_eq!(hot.len(), 1);
        assert_eq!(hot[0].volatility, 0.9);
    }
}
