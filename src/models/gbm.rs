// src/models/gbm.rs
//! Risk-neutral Geometric Brownian Motion path generation
//!
//! # Mathematical Framework
//!
//! Under the risk-neutral measure with continuous dividend yield q:
//! ```text
//! dS_t = (r - q) S_t dt + σ S_t dW_t
//! ```
//!
//! The exact solution over a step of length Δt is used, so paths carry no
//! discretisation bias and stay strictly positive:
//! ```text
//! S_{i+1} = S_i * exp((r - q - σ²/2)Δt + σ√Δt * Z_i),   Z_i ~ N(0,1)
//! ```

use crate::error::{validation::*, PricingResult};
use crate::market::MarketData;
use crate::rng;
use rand::Rng;

/// One discretised price path, owned by the replication that drew it
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedPath {
    /// `[S_0, S_1, ..., S_N]`, `S_0` = spot
    pub prices: Vec<f64>,
    /// Brownian motion at the grid points, `W_0 = 0`
    pub brownian: Vec<f64>,
    /// Step length
    pub dt: f64,
}

impl SimulatedPath {
    pub fn steps(&self) -> usize {
        self.prices.len() - 1
    }

    pub fn spot(&self) -> f64 {
        self.prices[0]
    }

    pub fn terminal(&self) -> f64 {
        self.prices[self.prices.len() - 1]
    }

    /// Observation time of grid point `i`
    pub fn time(&self, i: usize) -> f64 {
        i as f64 * self.dt
    }
}

/// Exact-step GBM generator for a fixed market, horizon and grid
#[derive(Debug, Clone, Copy)]
pub struct GbmPathGenerator {
    spot: f64,
    steps: usize,
    dt: f64,
    sqrt_dt: f64,
    drift_dt: f64,
    volatility: f64,
}

impl GbmPathGenerator {
    /// Fails with `InvalidParameter` if `steps < 1` or `expiry ≤ 0`
    pub fn new(market: &MarketData, expiry: f64, steps: usize) -> PricingResult<Self> {
        validate_steps(steps)?;
        validate_positive("expiry", expiry)?;
        validate_finite("expiry", expiry)?;

        let sigma = market.volatility();
        let dt = expiry / steps as f64;
        Ok(GbmPathGenerator {
            spot: market.spot(),
            steps,
            dt,
            sqrt_dt: dt.sqrt(),
            drift_dt: (market.rate() - market.dividend() - 0.5 * sigma * sigma) * dt,
            volatility: sigma,
        })
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Apply one exact GBM step given a standard normal draw
    #[inline]
    pub fn exact_step(&self, s_t: f64, normal_draw: f64) -> f64 {
        s_t * (self.drift_dt + self.volatility * self.sqrt_dt * normal_draw).exp()
    }

    /// Draw a path. Consumes exactly `steps` normal draws from `rng`.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> SimulatedPath {
        let mut prices = Vec::with_capacity(self.steps + 1);
        let mut brownian = Vec::with_capacity(self.steps + 1);
        prices.push(self.spot);
        brownian.push(0.0);

        let mut current_s = self.spot;
        let mut current_w = 0.0;
        for _ in 0..self.steps {
            let z = rng::get_normal_draw(rng);
            current_s = self.exact_step(current_s, z);
            current_w += self.sqrt_dt * z;
            prices.push(current_s);
            brownian.push(current_w);
        }

        SimulatedPath {
            prices,
            brownian,
            dt: self.dt,
        }
    }
}

/// Rebuild `path` under a different spot and volatility, reusing its Brownian
/// increments. Used for common-random-number sensitivities.
pub fn reprice_path(path: &SimulatedPath, market: &MarketData, spot: f64, volatility: f64) -> Vec<f64> {
    let nu = market.rate() - market.dividend() - 0.5 * volatility * volatility;
    path.brownian
        .iter()
        .enumerate()
        .map(|(i, w)| spot * (nu * path.time(i) + volatility * w).exp())
        .collect()
}
