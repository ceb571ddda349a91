// src/mc/accumulator.rs
//! Running sums over replications
//!
//! Partial accumulators are built per batch and merged in batch order, so a
//! run's result does not depend on how batches were scheduled.

use crate::error::{PricingError, PricingResult};

/// Cancellation noise below this (relative to the second moment) is clamped to zero
const NEGATIVE_VARIANCE_TOLERANCE: f64 = 1e-10;

/// `{count, sum, sum_of_squares}` of one scalar sample stream
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Accumulator {
    count: u64,
    sum: f64,
    sum_sq: f64,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn add(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.sum_sq += value * value;
    }

    pub fn merge(&mut self, other: &Accumulator) {
        self.count += other.count;
        self.sum += other.sum;
        self.sum_sq += other.sum_sq;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn sum_of_squares(&self) -> f64 {
        self.sum_sq
    }

    pub fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }

    /// Unbiased sample variance `(Σx²/n - x̄²) · n/(n-1)`
    pub fn sample_variance(&self) -> PricingResult<f64> {
        if self.count < 2 {
            return Err(PricingError::InvalidParameter {
                parameter: "nreps".to_string(),
                value: self.count as f64,
                constraint: "must be at least 2 (sample variance undefined)".to_string(),
            });
        }
        let n = self.count as f64;
        let mean = self.mean();
        let second_moment = self.sum_sq / n;
        clamp_variance(
            "sample variance",
            (second_moment - mean * mean) * n / (n - 1.0),
            second_moment,
        )
    }

    /// `sqrt(variance / n)`
    pub fn standard_error(&self) -> PricingResult<f64> {
        Ok((self.sample_variance()? / self.count as f64).sqrt())
    }
}

/// Target/control pair for the regression-optimal coefficient
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PairAccumulator {
    target: Accumulator,
    control: Accumulator,
    sum_cross: f64,
}

/// Control-variate estimate with the coefficient it was built from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionEstimate {
    pub mean: f64,
    pub stderr: f64,
    pub beta: f64,
}

impl PairAccumulator {
    #[inline]
    pub fn add(&mut self, target: f64, control: f64) {
        self.target.add(target);
        self.control.add(control);
        self.sum_cross += target * control;
    }

    pub fn merge(&mut self, other: &PairAccumulator) {
        self.target.merge(&other.target);
        self.control.merge(&other.control);
        self.sum_cross += other.sum_cross;
    }

    pub fn count(&self) -> u64 {
        self.target.count
    }

    /// Sample covariance of target and control
    pub fn covariance(&self) -> f64 {
        let n = self.count() as f64;
        (self.sum_cross / n - self.target.mean() * self.control.mean()) * n / (n - 1.0)
    }

    /// Estimate `Y - β* X` with `β* = Cov(Y,X)/Var(X)`; the control has mean zero.
    /// A degenerate control (no variance) falls back to `β = 0`.
    pub fn regress(&self) -> PricingResult<RegressionEstimate> {
        let var_target = self.target.sample_variance()?;
        let var_control = self.control.sample_variance()?;
        let covariance = self.covariance();

        let beta = if var_control > 1e-14 {
            covariance / var_control
        } else {
            tracing::warn!(var_control, "control has no variance; using beta = 0");
            0.0
        };

        let n = self.count() as f64;
        let mean = self.target.mean() - beta * self.control.mean();
        let variance = clamp_variance(
            "control variate regression",
            var_target - 2.0 * beta * covariance + beta * beta * var_control,
            var_target.max(self.target.sum_sq / n),
        )?;

        Ok(RegressionEstimate {
            mean,
            stderr: (variance / n).sqrt(),
            beta,
        })
    }
}

fn clamp_variance(method: &str, variance: f64, scale: f64) -> PricingResult<f64> {
    if !variance.is_finite() {
        return Err(PricingError::NumericalInstability {
            method: method.to_string(),
            reason: format!("Variance estimate is not finite: {}", variance),
        });
    }
    if variance >= 0.0 {
        return Ok(variance);
    }
    if variance > -NEGATIVE_VARIANCE_TOLERANCE * scale.max(1.0) {
        tracing::warn!(variance, method, "clamping rounding-level negative variance to zero");
        Ok(0.0)
    } else {
        Err(PricingError::NumericalInstability {
            method: method.to_string(),
            reason: format!("Variance estimate became significantly negative: {}", variance),
        })
    }
}
