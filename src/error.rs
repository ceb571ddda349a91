// src/error.rs
use thiserror::Error;

/// Error types for the asian-mc library
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PricingError {
    /// A numeric input outside its admissible domain
    #[error("Invalid parameter '{parameter}' = {value}: {constraint}")]
    InvalidParameter {
        parameter: String,
        value: f64,
        constraint: String,
    },

    /// Control-variate estimation requested for a payoff without a closed-form control
    #[error("Unsupported payoff '{payoff}' for {pricer} pricer: no closed-form control available")]
    UnsupportedPayoff { payoff: String, pricer: String },

    /// Invalid configuration
    #[error("Invalid configuration for '{field}': {reason}")]
    InvalidConfiguration { field: String, reason: String },

    /// Numerical instability in the estimator
    #[error("Numerical instability in {method}: {reason}")]
    NumericalInstability { method: String, reason: String },

    /// Dedicated worker pool could not be created
    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}

/// Result type alias for asian-mc operations
pub type PricingResult<T> = Result<T, PricingError>;

/// Validation utilities
pub mod validation {
    use super::{PricingError, PricingResult};

    /// Upper bound on replications per run
    pub const MAX_REPLICATIONS: usize = 1_000_000_000;
    /// Upper bound on time steps per path
    pub const MAX_STEPS: usize = 100_000;

    /// Validate that a parameter is positive
    pub fn validate_positive(name: &str, value: f64) -> PricingResult<()> {
        if value.is_nan() || value <= 0.0 {
            Err(PricingError::InvalidParameter {
                parameter: name.to_string(),
                value,
                constraint: "must be positive (> 0)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate that a parameter is non-negative
    pub fn validate_non_negative(name: &str, value: f64) -> PricingResult<()> {
        if value.is_nan() || value < 0.0 {
            Err(PricingError::InvalidParameter {
                parameter: name.to_string(),
                value,
                constraint: "must be non-negative (≥ 0)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate that a value is finite and not NaN
    pub fn validate_finite(name: &str, value: f64) -> PricingResult<()> {
        if !value.is_finite() {
            Err(PricingError::InvalidParameter {
                parameter: name.to_string(),
                value,
                constraint: "must be finite (not NaN or infinite)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate replication count. The sample variance needs at least two.
    pub fn validate_replications(nreps: usize) -> PricingResult<()> {
        if nreps < 2 {
            Err(PricingError::InvalidParameter {
                parameter: "nreps".to_string(),
                value: nreps as f64,
                constraint: "must be at least 2 (sample variance undefined)".to_string(),
            })
        } else if nreps > MAX_REPLICATIONS {
            Err(PricingError::InvalidConfiguration {
                field: "nreps".to_string(),
                reason: "exceeds maximum allowed (1 billion)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate steps count
    pub fn validate_steps(steps: usize) -> PricingResult<()> {
        if steps == 0 {
            Err(PricingError::InvalidParameter {
                parameter: "steps".to_string(),
                value: 0.0,
                constraint: "must be at least 1".to_string(),
            })
        } else if steps > MAX_STEPS {
            Err(PricingError::InvalidConfiguration {
                field: "steps".to_string(),
                reason: "exceeds maximum allowed (100,000)".to_string(),
            })
        } else {
            Ok(())
        }
    }
}
