//! Option Payoff Functions
//!
//! # Mathematical Definitions
//!
//! ## European Options
//! - **Call**: max(S_T - K, 0)
//! - **Put**: max(K - S_T, 0)
//!
//! ## Asian Options
//! Averages are taken over the N monitoring points `S_1..S_N` of the path;
//! the spot `S_0` is not a fixing.
//! - **Arithmetic**: A = (1/N) Σ S_i
//! - **Geometric**: G = exp((1/N) Σ ln S_i)
//!
//! # Strike Boundary
//!
//! An underlying sitting exactly on the strike counts as in-the-money for
//! indicator purposes (pathwise Greeks). The payoff value there is zero either way.
//!
//! # Extension Point
//!
//! User payoffs implement [`PathEvaluator`] and are wrapped in
//! [`PayoffKind::Custom`].

use crate::analytics::{asian_geometric, bs_analytic};
use crate::error::{validation::*, PricingError, PricingResult};
use crate::market::MarketData;
use std::fmt;
use std::sync::Arc;

/// User-supplied payoff shape. Must be a pure function of the path.
pub trait PathEvaluator: Send + Sync {
    /// Human-readable name used in errors and logs
    fn name(&self) -> &str;

    /// Undiscounted, non-negative payoff for `path = [S_0, ..., S_N]`
    fn evaluate(&self, path: &[f64], strike: f64) -> f64;

    /// Built-in closed-form control paired with this payoff, if any
    fn control(&self) -> Option<ControlKind> {
        None
    }
}

/// Payoffs with a closed-form expectation usable as a control variate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    GeometricAsianCall,
    GeometricAsianPut,
}

impl ControlKind {
    pub fn payoff_kind(&self) -> PayoffKind {
        match self {
            ControlKind::GeometricAsianCall => PayoffKind::GeometricAsianCall,
            ControlKind::GeometricAsianPut => PayoffKind::GeometricAsianPut,
        }
    }

    /// Discounted closed-form value on a `steps`-fixing grid
    pub fn closed_form(&self, market: &MarketData, strike: f64, expiry: f64, steps: usize) -> f64 {
        match self {
            ControlKind::GeometricAsianCall => {
                asian_geometric::geometric_asian_call_price(market, strike, expiry, steps)
            }
            ControlKind::GeometricAsianPut => {
                asian_geometric::geometric_asian_put_price(market, strike, expiry, steps)
            }
        }
    }
}

/// Payoff shape selector
#[derive(Clone)]
pub enum PayoffKind {
    VanillaCall,
    VanillaPut,
    ArithmeticAsianCall,
    ArithmeticAsianPut,
    GeometricAsianCall,
    GeometricAsianPut,
    Custom(Arc<dyn PathEvaluator>),
}

impl PayoffKind {
    pub fn name(&self) -> &str {
        match self {
            PayoffKind::VanillaCall => "vanilla call",
            PayoffKind::VanillaPut => "vanilla put",
            PayoffKind::ArithmeticAsianCall => "arithmetic asian call",
            PayoffKind::ArithmeticAsianPut => "arithmetic asian put",
            PayoffKind::GeometricAsianCall => "geometric asian call",
            PayoffKind::GeometricAsianPut => "geometric asian put",
            PayoffKind::Custom(evaluator) => evaluator.name(),
        }
    }

    /// Look up a built-in evaluator by name, e.g. `"geometric asian call"`.
    /// Case, hyphens and underscores are ignored.
    pub fn parse(name: &str) -> PricingResult<Self> {
        let normalized: String = name
            .to_ascii_lowercase()
            .chars()
            .map(|c| if c == '-' || c == '_' { ' ' } else { c })
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        match normalized.as_str() {
            "vanilla call" | "call" | "european call" => Ok(PayoffKind::VanillaCall),
            "vanilla put" | "put" | "european put" => Ok(PayoffKind::VanillaPut),
            "arithmetic asian call" => Ok(PayoffKind::ArithmeticAsianCall),
            "arithmetic asian put" => Ok(PayoffKind::ArithmeticAsianPut),
            "geometric asian call" => Ok(PayoffKind::GeometricAsianCall),
            "geometric asian put" => Ok(PayoffKind::GeometricAsianPut),
            _ => Err(PricingError::InvalidConfiguration {
                field: "payoff".to_string(),
                reason: format!("unknown payoff evaluator '{}'", name),
            }),
        }
    }

    /// Call-like payoffs pay when the underlying finishes above the strike
    pub(crate) fn is_call(&self) -> Option<bool> {
        match self {
            PayoffKind::VanillaCall | PayoffKind::ArithmeticAsianCall | PayoffKind::GeometricAsianCall => {
                Some(true)
            }
            PayoffKind::VanillaPut | PayoffKind::ArithmeticAsianPut | PayoffKind::GeometricAsianPut => {
                Some(false)
            }
            PayoffKind::Custom(_) => None,
        }
    }
}

impl fmt::Debug for PayoffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayoffKind::Custom(evaluator) => write!(f, "Custom({})", evaluator.name()),
            other => write!(f, "{}", other.name()),
        }
    }
}

/// Arithmetic mean of the fixings `S_1..S_N`
pub fn arithmetic_average(path: &[f64]) -> f64 {
    let fixings = &path[1..];
    fixings.iter().sum::<f64>() / fixings.len() as f64
}

/// Geometric mean of the fixings `S_1..S_N`, computed in log space
pub fn geometric_average(path: &[f64]) -> f64 {
    let fixings = &path[1..];
    (fixings.iter().map(|s| s.ln()).sum::<f64>() / fixings.len() as f64).exp()
}

/// A payoff contract: expiry, strike and shape
#[derive(Debug, Clone)]
pub struct Payoff {
    expiry: f64,
    strike: f64,
    kind: PayoffKind,
}

impl Payoff {
    pub fn new(expiry: f64, strike: f64, kind: PayoffKind) -> PricingResult<Self> {
        validate_positive("expiry", expiry)?;
        validate_finite("expiry", expiry)?;
        validate_positive("strike", strike)?;
        validate_finite("strike", strike)?;
        Ok(Payoff { expiry, strike, kind })
    }

    /// Build from a named evaluator, see [`PayoffKind::parse`]
    pub fn named(expiry: f64, strike: f64, name: &str) -> PricingResult<Self> {
        Self::new(expiry, strike, PayoffKind::parse(name)?)
    }

    pub fn custom(expiry: f64, strike: f64, evaluator: Arc<dyn PathEvaluator>) -> PricingResult<Self> {
        Self::new(expiry, strike, PayoffKind::Custom(evaluator))
    }

    pub fn expiry(&self) -> f64 {
        self.expiry
    }

    pub fn strike(&self) -> f64 {
        self.strike
    }

    pub fn kind(&self) -> &PayoffKind {
        &self.kind
    }

    pub fn name(&self) -> &str {
        self.kind.name()
    }

    /// The quantity compared against the strike: terminal price or average.
    /// `None` for custom evaluators.
    pub fn underlying(&self, path: &[f64]) -> Option<f64> {
        match self.kind {
            PayoffKind::VanillaCall | PayoffKind::VanillaPut => path.last().copied(),
            PayoffKind::ArithmeticAsianCall | PayoffKind::ArithmeticAsianPut => {
                Some(arithmetic_average(path))
            }
            PayoffKind::GeometricAsianCall | PayoffKind::GeometricAsianPut => {
                Some(geometric_average(path))
            }
            PayoffKind::Custom(_) => None,
        }
    }

    /// Whether the path finishes in-the-money; the strike itself counts as in.
    pub fn in_the_money(&self, path: &[f64]) -> Option<bool> {
        let underlying = self.underlying(path)?;
        self.kind.is_call().map(|is_call| {
            if is_call {
                underlying >= self.strike
            } else {
                underlying <= self.strike
            }
        })
    }

    /// Undiscounted payoff of a path `[S_0, ..., S_N]` with `N ≥ 1`
    pub fn evaluate(&self, path: &[f64]) -> f64 {
        match &self.kind {
            PayoffKind::Custom(evaluator) => evaluator.evaluate(path, self.strike),
            kind => {
                let underlying = self.underlying(path).unwrap_or(0.0);
                match kind.is_call() {
                    Some(true) => (underlying - self.strike).max(0.0),
                    _ => (self.strike - underlying).max(0.0),
                }
            }
        }
    }

    /// Closed-form control paired with this payoff
    pub fn control(&self) -> Option<ControlKind> {
        match &self.kind {
            PayoffKind::ArithmeticAsianCall | PayoffKind::GeometricAsianCall => {
                Some(ControlKind::GeometricAsianCall)
            }
            PayoffKind::ArithmeticAsianPut | PayoffKind::GeometricAsianPut => {
                Some(ControlKind::GeometricAsianPut)
            }
            PayoffKind::VanillaCall | PayoffKind::VanillaPut => None,
            PayoffKind::Custom(evaluator) => evaluator.control(),
        }
    }

    /// Discounted analytic value where one exists, on a `steps`-fixing grid
    pub fn closed_form(&self, market: &MarketData, steps: usize) -> Option<f64> {
        let (s, k, r, q, sigma, t) = (
            market.spot(),
            self.strike,
            market.rate(),
            market.dividend(),
            market.volatility(),
            self.expiry,
        );
        match self.kind {
            PayoffKind::VanillaCall => Some(bs_analytic::bs_call_price(s, k, r, q, sigma, t)),
            PayoffKind::VanillaPut => Some(bs_analytic::bs_put_price(s, k, r, q, sigma, t)),
            PayoffKind::GeometricAsianCall => Some(ControlKind::GeometricAsianCall.closed_form(market, k, t, steps)),
            PayoffKind::GeometricAsianPut => Some(ControlKind::GeometricAsianPut.closed_form(market, k, t, steps)),
            _ => None,
        }
    }
}
