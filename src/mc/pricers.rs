// src/mc/pricers.rs
//! Per-replication estimators
//!
//! Each pricer turns exactly one simulated path into one unbiased sample of
//! the discounted payoff `e^(-rT) h(S)`:
//!
//! 1. **Naive**: `Y = e^(-rT) h(S)`
//! 2. **Pathwise**: same price sample as naive; additionally differentiates
//!    the payoff along the path for delta and vega.
//! 3. **Control variate**: `Y - β (X - E[X])` where X is a discounted
//!    geometric Asian payoff on the *same* path and E\[X\] is its closed form.
//!
//! # Pathwise Derivatives
//!
//! Along an exact GBM path `S_i = S₀ exp(ν t_i + σ W_i)`:
//! ```text
//! ∂S_i/∂S₀ = S_i / S₀
//! ∂S_i/∂σ  = S_i (W_i - σ t_i)
//! ```
//! so for a call on underlying U (terminal price or average):
//! ```text
//! δ_path = e^(-rT) 1{U ≥ K} ∂U/∂S₀,     ν_path = e^(-rT) 1{U ≥ K} ∂U/∂σ
//! ```

use crate::error::{PricingError, PricingResult};
use crate::market::MarketData;
use crate::mc::payoffs::{ControlKind, Payoff, PayoffKind};
use crate::models::gbm::{self, GbmPathGenerator, SimulatedPath};
use bitflags::bitflags;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Relative bump for central differences on custom evaluators
const CUSTOM_BUMP: f64 = 1e-4;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct GreeksConfig: u32 {
        const NONE  = 0;
        const DELTA = 1 << 0;
        const VEGA  = 1 << 1;
    }
}

/// How the control-variate coefficient β is chosen
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ControlCoefficient {
    /// Constant β
    Fixed(f64),
    /// β* = Cov(Y, X) / Var(X) estimated from the run's own samples
    Estimated,
}

impl Default for ControlCoefficient {
    fn default() -> Self {
        ControlCoefficient::Fixed(1.0)
    }
}

/// The closed set of estimator strategies
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pricer {
    Naive,
    Pathwise(GreeksConfig),
    ControlVariate(ControlCoefficient),
}

impl Pricer {
    /// Pathwise pricer computing delta and vega
    pub fn pathwise() -> Self {
        Pricer::Pathwise(GreeksConfig::DELTA | GreeksConfig::VEGA)
    }

    /// Control variate with β = 1
    pub fn control_variate() -> Self {
        Pricer::ControlVariate(ControlCoefficient::default())
    }

    pub fn name(&self) -> &'static str {
        match self {
            Pricer::Naive => "naive",
            Pricer::Pathwise(_) => "pathwise",
            Pricer::ControlVariate(_) => "control variate",
        }
    }

    /// β applied to each replication (zero without a control); `None` when β is estimated
    pub fn fixed_beta(&self) -> Option<f64> {
        match self {
            Pricer::ControlVariate(ControlCoefficient::Fixed(beta)) => Some(*beta),
            Pricer::ControlVariate(ControlCoefficient::Estimated) => None,
            _ => Some(0.0),
        }
    }

    /// Validate the pairing and precompute everything shared by replications
    pub fn prepare(
        &self,
        market: &MarketData,
        payoff: &Payoff,
        steps: usize,
    ) -> PricingResult<PreparedPricer> {
        let generator = GbmPathGenerator::new(market, payoff.expiry(), steps)?;

        let control = match self {
            Pricer::ControlVariate(coefficient) => {
                if let ControlCoefficient::Fixed(beta) = coefficient {
                    crate::error::validation::validate_finite("beta", *beta)?;
                }
                let kind = payoff.control().ok_or_else(|| PricingError::UnsupportedPayoff {
                    payoff: payoff.name().to_string(),
                    pricer: self.name().to_string(),
                })?;
                Some(PreparedControl::new(kind, market, payoff, steps)?)
            }
            _ => None,
        };

        let greeks = match self {
            Pricer::Pathwise(greeks) => *greeks,
            _ => GreeksConfig::NONE,
        };

        Ok(PreparedPricer {
            pricer: *self,
            market: *market,
            payoff: payoff.clone(),
            generator,
            discount: market.discount_factor(payoff.expiry()),
            control,
            greeks,
        })
    }

    /// Run one replication from scratch
    pub fn estimate<R: Rng + ?Sized>(
        &self,
        market: &MarketData,
        payoff: &Payoff,
        steps: usize,
        rng: &mut R,
    ) -> PricingResult<Replication> {
        Ok(self.prepare(market, payoff, steps)?.estimate(rng))
    }
}

impl fmt::Display for Pricer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Pathwise sensitivities of one replication, already discounted
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PathwiseGreeks {
    pub delta: Option<f64>,
    pub vega: Option<f64>,
}

/// Outcome of a single replication
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Replication {
    /// Discounted target payoff
    pub target: f64,
    /// Discounted control payoff minus its closed-form value
    pub control_deviation: Option<f64>,
    pub greeks: Option<PathwiseGreeks>,
}

impl Replication {
    /// Estimator sample `target - β (X - E[X])`
    pub fn value(&self, beta: f64) -> f64 {
        match self.control_deviation {
            Some(deviation) => self.target - beta * deviation,
            None => self.target,
        }
    }
}

#[derive(Debug, Clone)]
struct PreparedControl {
    payoff: Payoff,
    closed_form: f64,
}

impl PreparedControl {
    fn new(kind: ControlKind, market: &MarketData, target: &Payoff, steps: usize) -> PricingResult<Self> {
        Ok(PreparedControl {
            payoff: Payoff::new(target.expiry(), target.strike(), kind.payoff_kind())?,
            closed_form: kind.closed_form(market, target.strike(), target.expiry(), steps),
        })
    }
}

/// A pricer bound to one market, payoff and grid
#[derive(Debug, Clone)]
pub struct PreparedPricer {
    pricer: Pricer,
    market: MarketData,
    payoff: Payoff,
    generator: GbmPathGenerator,
    discount: f64,
    control: Option<PreparedControl>,
    greeks: GreeksConfig,
}

impl PreparedPricer {
    pub fn pricer(&self) -> Pricer {
        self.pricer
    }

    pub fn discount(&self) -> f64 {
        self.discount
    }

    /// Closed-form value of the control, if the pricer uses one
    pub fn control_closed_form(&self) -> Option<f64> {
        self.control.as_ref().map(|c| c.closed_form)
    }

    /// One replication: draw one path, evaluate, discount once
    pub fn estimate<R: Rng + ?Sized>(&self, rng: &mut R) -> Replication {
        let path = self.generator.generate(rng);
        let target = self.discount * self.payoff.evaluate(&path.prices);

        let control_deviation = self
            .control
            .as_ref()
            .map(|c| self.discount * c.payoff.evaluate(&path.prices) - c.closed_form);

        let greeks = if self.greeks.is_empty() {
            None
        } else {
            Some(self.pathwise_greeks(&path))
        };

        Replication {
            target,
            control_deviation,
            greeks,
        }
    }

    fn pathwise_greeks(&self, path: &SimulatedPath) -> PathwiseGreeks {
        let want_delta = self.greeks.contains(GreeksConfig::DELTA);
        let want_vega = self.greeks.contains(GreeksConfig::VEGA);

        if let PayoffKind::Custom(_) = self.payoff.kind() {
            return PathwiseGreeks {
                delta: want_delta.then(|| self.discount * self.bumped_delta(path)),
                vega: want_vega.then(|| self.discount * self.bumped_vega(path)),
            };
        }

        let sign = match self.payoff.in_the_money(&path.prices) {
            Some(true) if self.payoff.kind().is_call() == Some(true) => 1.0,
            Some(true) => -1.0,
            _ => 0.0,
        };

        PathwiseGreeks {
            delta: want_delta.then(|| self.discount * sign * self.underlying_delta(path)),
            vega: want_vega.then(|| self.discount * sign * self.underlying_vega(path)),
        }
    }

    /// ∂U/∂S₀. Every grid point scales linearly with spot.
    fn underlying_delta(&self, path: &SimulatedPath) -> f64 {
        self.payoff.underlying(&path.prices).unwrap_or(0.0) / path.spot()
    }

    /// ∂U/∂σ for the built-in underlyings
    fn underlying_vega(&self, path: &SimulatedPath) -> f64 {
        let sigma = self.market.volatility();
        let sensitivity = |i: usize| path.brownian[i] - sigma * path.time(i);
        let n = path.steps();

        match self.payoff.kind() {
            PayoffKind::VanillaCall | PayoffKind::VanillaPut => path.terminal() * sensitivity(n),
            PayoffKind::ArithmeticAsianCall | PayoffKind::ArithmeticAsianPut => {
                (1..=n).map(|i| path.prices[i] * sensitivity(i)).sum::<f64>() / n as f64
            }
            PayoffKind::GeometricAsianCall | PayoffKind::GeometricAsianPut => {
                let g = self.payoff.underlying(&path.prices).unwrap_or(0.0);
                g * (1..=n).map(sensitivity).sum::<f64>() / n as f64
            }
            PayoffKind::Custom(_) => 0.0,
        }
    }

    fn bumped_delta(&self, path: &SimulatedPath) -> f64 {
        let spot = self.market.spot();
        let sigma = self.market.volatility();
        let h = CUSTOM_BUMP * spot;
        let up = gbm::reprice_path(path, &self.market, spot + h, sigma);
        let down = gbm::reprice_path(path, &self.market, spot - h, sigma);
        (self.payoff.evaluate(&up) - self.payoff.evaluate(&down)) / (2.0 * h)
    }

    fn bumped_vega(&self, path: &SimulatedPath) -> f64 {
        let spot = self.market.spot();
        let sigma = self.market.volatility();
        let h = CUSTOM_BUMP * sigma;
        let up = gbm::reprice_path(path, &self.market, spot, sigma + h);
        let down = gbm::reprice_path(path, &self.market, spot, sigma - h);
        (self.payoff.evaluate(&up) - self.payoff.evaluate(&down)) / (2.0 * h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::RngFactory;

    fn market() -> MarketData {
        MarketData::new(0.06, 100.0, 0.2, 0.03).expect("valid market")
    }

    fn payoff(kind: PayoffKind) -> Payoff {
        Payoff::new(1.0, 100.0, kind).expect("valid payoff")
    }

    #[test]
    fn test_naive_and_pathwise_agree_on_price() {
        let m = market();
        let p = payoff(PayoffKind::ArithmeticAsianCall);
        let factory = RngFactory::new(11);

        for id in 0..50 {
            let naive = Pricer::Naive
                .estimate(&m, &p, 10, &mut factory.for_replication(id))
                .expect("valid inputs");
            let pathwise = Pricer::pathwise()
                .estimate(&m, &p, 10, &mut factory.for_replication(id))
                .expect("valid inputs");
            assert_eq!(naive.target, pathwise.target);
            assert!(naive.greeks.is_none());
            assert!(pathwise.greeks.is_some());
        }
    }

    #[test]
    fn test_control_variate_rejects_vanilla() {
        let result = Pricer::control_variate().prepare(&market(), &payoff(PayoffKind::VanillaCall), 10);
        assert!(matches!(result, Err(PricingError::UnsupportedPayoff { .. })));
    }

    #[test]
    fn test_geometric_target_is_its_own_control() {
        let prepared = Pricer::control_variate()
            .prepare(&market(), &payoff(PayoffKind::GeometricAsianCall), 10)
            .expect("geometric pairs with itself");
        let closed_form = prepared.control_closed_form().expect("control present");

        let mut rng = RngFactory::new(3).for_replication(0);
        let rep = prepared.estimate(&mut rng);
        assert!((rep.value(1.0) - closed_form).abs() < 1e-12);
    }

    #[test]
    fn test_control_deviation_uses_same_path() {
        let m = market();
        let p = payoff(PayoffKind::ArithmeticAsianCall);
        let prepared = Pricer::control_variate().prepare(&m, &p, 12).expect("valid pairing");

        let mut rng = RngFactory::new(8).for_replication(4);
        let rep = prepared.estimate(&mut rng);

        let generator = GbmPathGenerator::new(&m, 1.0, 12).expect("valid grid");
        let path = generator.generate(&mut RngFactory::new(8).for_replication(4));
        let geometric = payoff(PayoffKind::GeometricAsianCall);
        let expected = prepared.discount() * geometric.evaluate(&path.prices)
            - prepared.control_closed_form().unwrap_or_default();
        assert_eq!(rep.control_deviation, Some(expected));
    }

    #[test]
    fn test_out_of_the_money_path_has_zero_greeks() {
        let m = market();
        let deep = Payoff::new(1.0, 1.0e6, PayoffKind::VanillaCall).expect("valid payoff");
        let rep = Pricer::pathwise()
            .estimate(&m, &deep, 4, &mut RngFactory::new(1).for_replication(0))
            .expect("valid inputs");
        let greeks = rep.greeks.expect("greeks requested");
        assert_eq!(greeks.delta, Some(0.0));
        assert_eq!(greeks.vega, Some(0.0));
    }

    #[test]
    fn test_put_delta_is_negative() {
        let m = market();
        let deep_put = Payoff::new(1.0, 1.0e6, PayoffKind::ArithmeticAsianPut).expect("valid payoff");
        let rep = Pricer::Pathwise(GreeksConfig::DELTA)
            .estimate(&m, &deep_put, 4, &mut RngFactory::new(1).for_replication(0))
            .expect("valid inputs");
        let greeks = rep.greeks.expect("greeks requested");
        assert!(greeks.delta.unwrap_or_default() < 0.0);
        assert_eq!(greeks.vega, None);
    }

    #[test]
    fn test_custom_bump_matches_exact_pathwise() {
        struct TerminalCall;
        impl crate::mc::payoffs::PathEvaluator for TerminalCall {
            fn name(&self) -> &str {
                "terminal call"
            }
            fn evaluate(&self, path: &[f64], strike: f64) -> f64 {
                (path[path.len() - 1] - strike).max(0.0)
            }
        }

        let m = market();
        // deep in the money so the kink is never inside the bump
        let exact = Payoff::new(1.0, 1.0, PayoffKind::VanillaCall).expect("valid payoff");
        let custom = Payoff::custom(1.0, 1.0, std::sync::Arc::new(TerminalCall)).expect("valid payoff");

        let a = Pricer::pathwise()
            .estimate(&m, &exact, 6, &mut RngFactory::new(2).for_replication(9))
            .expect("valid inputs")
            .greeks
            .expect("greeks requested");
        let b = Pricer::pathwise()
            .estimate(&m, &custom, 6, &mut RngFactory::new(2).for_replication(9))
            .expect("valid inputs")
            .greeks
            .expect("greeks requested");

        let (da, db) = (a.delta.unwrap_or_default(), b.delta.unwrap_or_default());
        let (va, vb) = (a.vega.unwrap_or_default(), b.vega.unwrap_or_default());
        assert!((da - db).abs() < 1e-6, "{} vs {}", da, db);
        assert!((va - vb).abs() < 1e-3 * va.abs().max(1.0), "{} vs {}", va, vb);
    }
}
