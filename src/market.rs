// src/market.rs
//! Immutable market snapshot shared by every replication of a run.

use crate::error::{validation::*, PricingError, PricingResult};
use serde::{Deserialize, Serialize};

/// Flat Black-Scholes market: continuously compounded rate and dividend
/// yield, constant volatility.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMarketData")]
pub struct MarketData {
    rate: f64,
    spot: f64,
    volatility: f64,
    dividend: f64,
}

/// Unchecked wire form; every deserialised market goes through `MarketData::new`
#[derive(Deserialize)]
struct RawMarketData {
    rate: f64,
    spot: f64,
    volatility: f64,
    dividend: f64,
}

impl TryFrom<RawMarketData> for MarketData {
    type Error = PricingError;

    fn try_from(raw: RawMarketData) -> PricingResult<Self> {
        MarketData::new(raw.rate, raw.spot, raw.volatility, raw.dividend)
    }
}

impl MarketData {
    pub fn new(rate: f64, spot: f64, volatility: f64, dividend: f64) -> PricingResult<Self> {
        let market = MarketData {
            rate,
            spot,
            volatility,
            dividend,
        };
        market.validate()?;
        Ok(market)
    }

    /// Re-check the invariants
    pub fn validate(&self) -> PricingResult<()> {
        validate_finite("rate", self.rate)?;
        validate_positive("spot", self.spot)?;
        validate_finite("spot", self.spot)?;
        validate_positive("volatility", self.volatility)?;
        validate_finite("volatility", self.volatility)?;
        validate_non_negative("dividend", self.dividend)?;
        validate_finite("dividend", self.dividend)
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn spot(&self) -> f64 {
        self.spot
    }

    pub fn volatility(&self) -> f64 {
        self.volatility
    }

    pub fn dividend(&self) -> f64 {
        self.dividend
    }

    /// `exp(-r T)`
    pub fn discount_factor(&self, expiry: f64) -> f64 {
        (-self.rate * expiry).exp()
    }

    /// Risk-neutral forward `S₀ exp((r - q) T)`
    pub fn forward(&self, expiry: f64) -> f64 {
        self.spot * ((self.rate - self.dividend) * expiry).exp()
    }

    /// Copy with a bumped spot, for finite-difference checks
    pub fn with_spot(&self, spot: f64) -> PricingResult<Self> {
        Self::new(self.rate, spot, self.volatility, self.dividend)
    }

    /// Copy with a bumped volatility
    pub fn with_volatility(&self, volatility: f64) -> PricingResult<Self> {
        Self::new(self.rate, self.spot, volatility, self.dividend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_market() {
        let market = MarketData::new(0.06, 100.0, 0.2, 0.03).expect("valid market");
        assert_eq!(market.spot(), 100.0);
        assert!((market.forward(1.0) - 100.0 * 0.03f64.exp()).abs() < 1e-12);
        assert!((market.discount_factor(1.0) - (-0.06f64).exp()).abs() < 1e-15);
    }

    #[test]
    fn test_rejects_bad_inputs() {
        for (r, s, v, q) in [
            (0.06, 0.0, 0.2, 0.0),
            (0.06, -1.0, 0.2, 0.0),
            (0.06, 100.0, 0.0, 0.0),
            (0.06, 100.0, -0.2, 0.0),
            (0.06, 100.0, 0.2, -0.01),
            (f64::NAN, 100.0, 0.2, 0.0),
        ] {
            assert!(matches!(
                MarketData::new(r, s, v, q),
                Err(PricingError::InvalidParameter { .. })
            ));
        }
    }

    #[test]
    fn test_negative_rate_allowed() {
        assert!(MarketData::new(-0.005, 100.0, 0.2, 0.0).is_ok());
    }

    #[test]
    fn test_deserialization_rejects_invalid_market() {
        for json in [
            r#"{"rate":0.05,"spot":100.0,"volatility":-0.2,"dividend":0.0}"#,
            r#"{"rate":0.05,"spot":0.0,"volatility":0.2,"dividend":0.0}"#,
            r#"{"rate":0.05,"spot":100.0,"volatility":0.2,"dividend":-0.1}"#,
        ] {
            let result = serde_json::from_str::<MarketData>(json);
            assert!(result.is_err(), "accepted {}", json);
        }
    }

    #[test]
    fn test_deserialization_round_trips_valid_market() {
        let market = MarketData::new(0.06, 100.0, 0.2, 0.03).expect("valid market");
        let json = serde_json::to_string(&market).expect("serialisable");
        let back: MarketData = serde_json::from_str(&json).expect("valid json");
        assert_eq!(back, market);
    }
}
