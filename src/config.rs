// src/config.rs
use crate::error::{validation::*, PricingError, PricingResult};
use serde::{Deserialize, Serialize};
use std::env;

/// Environment variable prefix for [`EngineConfig::from_env`]
pub const ENV_PREFIX: &str = "ASIAN_MC_";

/// Simulation settings shared by every run of an engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of independent replications (`nreps`)
    pub replications: usize,
    /// Time steps per path
    pub steps: usize,
    /// Base seed; replication `i` draws from substream `i`
    pub seed: u64,
    /// Dedicated worker threads; `None` uses the global rayon pool
    pub threads: Option<usize>,
    /// Replications per work unit
    pub batch_size: usize,
    pub parallel: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            replications: 10_000,
            steps: 10,
            seed: 12345,
            threads: None,
            batch_size: 1_024,
            parallel: true,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> PricingResult<()> {
        validate_replications(self.replications)?;
        validate_steps(self.steps)?;

        if self.batch_size == 0 {
            return Err(PricingError::InvalidConfiguration {
                field: "batch_size".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.threads == Some(0) {
            return Err(PricingError::InvalidConfiguration {
                field: "threads".to_string(),
                reason: "must be greater than 0 when set".to_string(),
            });
        }
        Ok(())
    }

    /// Threads that will execute replications
    pub fn worker_threads(&self) -> usize {
        if !self.parallel {
            return 1;
        }
        self.threads.unwrap_or_else(num_cpus::get)
    }

    pub fn from_json_str(json: &str) -> PricingResult<Self> {
        let config: EngineConfig =
            serde_json::from_str(json).map_err(|e| PricingError::InvalidConfiguration {
                field: "json".to_string(),
                reason: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `ASIAN_MC_*` environment variables
    pub fn from_env() -> PricingResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> PricingResult<Self> {
        let mut config = EngineConfig::default();
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(v) = var("REPLICATIONS") {
            config.replications = parse_field("REPLICATIONS", &v)?;
        }
        if let Some(v) = var("STEPS") {
            config.steps = parse_field("STEPS", &v)?;
        }
        if let Some(v) = var("SEED") {
            config.seed = parse_field("SEED", &v)?;
        }
        if let Some(v) = var("THREADS") {
            config.threads = Some(parse_field("THREADS", &v)?);
        }
        if let Some(v) = var("BATCH_SIZE") {
            config.batch_size = parse_field("BATCH_SIZE", &v)?;
        }
        if let Some(v) = var("PARALLEL") {
            config.parallel = parse_field("PARALLEL", &v)?;
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_field<T>(name: &str, raw: &str) -> PricingResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| PricingError::InvalidConfiguration {
            field: format!("{}{}", ENV_PREFIX, name),
            reason: e.to_string(),
        })
}
