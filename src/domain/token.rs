use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A single ERC-20 token tracked on one chain.
///
/// `address` is always checksum-validated at construction time (C1's
/// validation rule applies transitively: nothing downstream constructs a
/// `Token` directly from an untrusted string).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
    pub chain_id: u64,
    /// Rolling volatility estimate in `[0, 1]`, updated by the Token Universe.
    pub volatility: f64,
    /// Last observed numeraire (USD) price; a ratio/score, never used for
    /// on-chain amount math.
    pub reference_price_usd: Option<f64>,
}

impl Token {
    pub fn new(
        address_hex: &str,
        symbol: impl Into<String>,
        decimals: u8,
        chain_id: u64,
    ) -> Result<Self, CoreError> {
        let address = Address::parse_checksummed(address_hex, None).map_err(|e| {
            CoreError::ConfigInvalid(format!("invalid checksum address {address_hex}: {e}"))
        })?;
        Ok(Self {
            address,
            symbol: symbol.into(),
            decimals,
            chain_id,
            volatility: 0.0,
            reference_price_usd: None,
        })
    }

    pub fn is_high_volatility(&self, threshold: f64) -> bool {
        self.volatility >= threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_checksummed_address() {
        let lower = "0x82af49447d8a07e3bd95bd0d56f35241523fbab1".to_lowercase();
        // Lowercase input without a checksum hint is accepted by
        // `parse_checksummed` only when it happens to match; an address
        // with injected case corruption must fail.
        let mangled = format!("0x{}", &lower[2..].to_uppercase());
        assert!(Token::new(&mangled, "WETH", 18, 42161).is_err());
    }

    #[test]
    fn accepts_valid_checksum() {
        let t = Token::new(
            "0x82aF49447D8a07e3bd95BD0d56f35241523fBab1",
            "WETH",
            18,
            42161,
        )
        .unwrap();
        assert_eq!(t.symbol, "WETH");
        assert_eq!(t.chain_id, 42161);
    }
}
