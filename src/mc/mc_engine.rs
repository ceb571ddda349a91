// src/mc/mc_engine.rs
use crate::config::EngineConfig;
use crate::error::{validation::*, PricingError, PricingResult};
use crate::market::MarketData;
use crate::mc::accumulator::{Accumulator, PairAccumulator};
use crate::mc::payoffs::Payoff;
use crate::mc::pricers::{PreparedPricer, Pricer, Replication};
use crate::rng::RngFactory;
use rayon::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Point estimate with its standard error
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GreekEstimate {
    pub value: f64,
    pub stderr: f64,
}

/// Pathwise sensitivities of the discounted payoff
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GreekEstimates {
    pub delta: Option<GreekEstimate>,
    pub vega: Option<GreekEstimate>,
}

/// Result of one engine run
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Estimate {
    pub price: f64,
    pub stderr: f64,
    pub replications: usize,
    /// Control coefficient applied, for control-variate runs
    pub beta: Option<f64>,
    pub greeks: Option<GreekEstimates>,
}

impl Estimate {
    /// `(price, stderr)`
    pub fn as_tuple(&self) -> (f64, f64) {
        (self.price, self.stderr)
    }

    /// 95% confidence half-width
    pub fn confidence_95(&self) -> f64 {
        1.96 * self.stderr
    }
}

/// Per-batch running sums
#[derive(Debug, Clone, Copy, Default)]
struct RunStatistics {
    value: Accumulator,
    pair: PairAccumulator,
    delta: Accumulator,
    vega: Accumulator,
}

impl RunStatistics {
    fn record(&mut self, replication: &Replication, beta: f64) -> PricingResult<()> {
        let value = replication.value(beta);
        if !value.is_finite() {
            return Err(PricingError::NumericalInstability {
                method: "Monte Carlo replication".to_string(),
                reason: format!("estimator sample is not finite: {}", value),
            });
        }
        if replication.target < 0.0 {
            return Err(PricingError::NumericalInstability {
                method: "Monte Carlo replication".to_string(),
                reason: format!("payoff sample is negative: {}", replication.target),
            });
        }
        self.value.add(value);

        if let Some(deviation) = replication.control_deviation {
            self.pair.add(replication.target, deviation);
        }
        if let Some(greeks) = replication.greeks {
            if let Some(delta) = greeks.delta {
                self.delta.add(delta);
            }
            if let Some(vega) = greeks.vega {
                self.vega.add(vega);
            }
        }
        Ok(())
    }

    fn merge(mut self, other: &RunStatistics) -> Self {
        self.value.merge(&other.value);
        self.pair.merge(&other.pair);
        self.delta.merge(&other.delta);
        self.vega.merge(&other.vega);
        self
    }
}

fn greek_estimate(acc: &Accumulator) -> PricingResult<Option<GreekEstimate>> {
    if acc.count() == 0 {
        return Ok(None);
    }
    Ok(Some(GreekEstimate {
        value: acc.mean(),
        stderr: acc.standard_error()?,
    }))
}

/// Monte Carlo engine: `nreps` independent replications of one pricer
///
/// # Estimator
///
/// With samples `Y_i` from the pricer:
/// ```text
/// price  = (1/n) Σ Y_i
/// s²     = (Σ Y_i²/n - price²) · n/(n-1)
/// stderr = √(s²/n)
/// ```
///
/// # Parallelism
///
/// Replications are cut into fixed batches of `batch_size`. Batches run on
/// rayon and their partial sums are merged in batch order, so the result is
/// bit-identical for any thread count.
#[derive(Clone)]
pub struct MonteCarloEngine {
    config: EngineConfig,
    pricer: Pricer,
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl std::fmt::Debug for MonteCarloEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonteCarloEngine")
            .field("config", &self.config)
            .field("pricer", &self.pricer)
            .finish()
    }
}

impl MonteCarloEngine {
    pub fn new(config: EngineConfig, pricer: Pricer) -> PricingResult<Self> {
        config.validate()?;

        let pool = match (config.parallel, config.threads) {
            (true, Some(threads)) => Some(Arc::new(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| PricingError::ThreadPool(e.to_string()))?,
            )),
            _ => None,
        };

        Ok(MonteCarloEngine {
            config,
            pricer,
            pool,
        })
    }

    /// Engine with default settings apart from `nreps` and `steps`
    pub fn with_defaults(nreps: usize, steps: usize, pricer: Pricer) -> PricingResult<Self> {
        Self::new(
            EngineConfig {
                replications: nreps,
                steps,
                ..Default::default()
            },
            pricer,
        )
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn pricer(&self) -> Pricer {
        self.pricer
    }

    /// Price `payoff` with this engine's settings
    pub fn run(&self, market: &MarketData, payoff: &Payoff) -> PricingResult<Estimate> {
        self.simulate(self.config.replications, self.config.steps, self.pricer, market, payoff)
    }

    /// Price with explicit `nreps`, `steps` and pricer; seed and threading come
    /// from the engine's config
    pub fn run_with(
        &self,
        nreps: usize,
        steps: usize,
        pricer: Pricer,
        market: &MarketData,
        payoff: &Payoff,
    ) -> PricingResult<Estimate> {
        self.simulate(nreps, steps, pricer, market, payoff)
    }

    fn simulate(
        &self,
        nreps: usize,
        steps: usize,
        pricer: Pricer,
        market: &MarketData,
        payoff: &Payoff,
    ) -> PricingResult<Estimate> {
        validate_replications(nreps)?;
        validate_steps(steps)?;
        market.validate()?;

        let prepared = pricer.prepare(market, payoff, steps)?;
        let beta = pricer.fixed_beta().unwrap_or(1.0);
        let factory = RngFactory::new(self.config.seed);
        let batch_size = self.config.batch_size;
        // nreps >= 2 here, so this cannot underflow
        let batches = (nreps - 1) / batch_size + 1;

        debug!(
            pricer = %pricer,
            payoff = payoff.name(),
            nreps,
            steps,
            seed = self.config.seed,
            threads = self.config.worker_threads(),
            batches,
            "starting Monte Carlo run"
        );

        let run_batch = |batch: usize| -> PricingResult<RunStatistics> {
            let start = batch * batch_size;
            let end = start.saturating_add(batch_size).min(nreps);
            let stats = simulate_batch(&prepared, &factory, start, end, beta)?;
            trace!(batch, start, end, "batch complete");
            Ok(stats)
        };

        let partials: Vec<RunStatistics> = if self.config.parallel {
            let par_run = || {
                (0..batches)
                    .into_par_iter()
                    .map(run_batch)
                    .collect::<PricingResult<Vec<_>>>()
            };
            match &self.pool {
                Some(pool) => pool.install(par_run)?,
                None => par_run()?,
            }
        } else {
            (0..batches).map(run_batch).collect::<PricingResult<Vec<_>>>()?
        };

        let stats = partials
            .iter()
            .fold(RunStatistics::default(), |acc, partial| acc.merge(partial));

        let estimate = finish(&stats, &prepared, nreps)?;
        info!(
            pricer = %pricer,
            payoff = payoff.name(),
            price = estimate.price,
            stderr = estimate.stderr,
            "Monte Carlo run complete"
        );
        Ok(estimate)
    }
}

fn simulate_batch(
    prepared: &PreparedPricer,
    factory: &RngFactory,
    start: usize,
    end: usize,
    beta: f64,
) -> PricingResult<RunStatistics> {
    let mut stats = RunStatistics::default();
    for replication_id in start..end {
        let mut rng = factory.for_replication(replication_id as u64);
        let replication = prepared.estimate(&mut rng);
        stats.record(&replication, beta)?;
    }
    Ok(stats)
}

fn finish(stats: &RunStatistics, prepared: &PreparedPricer, nreps: usize) -> PricingResult<Estimate> {
    let pricer = prepared.pricer();

    let (price, stderr, beta) = match pricer {
        Pricer::ControlVariate(_) if pricer.fixed_beta().is_none() => {
            let regression = stats.pair.regress()?;
            debug!(beta = regression.beta, "estimated control coefficient");
            (regression.mean, regression.stderr, Some(regression.beta))
        }
        Pricer::ControlVariate(_) => (
            stats.value.mean(),
            stats.value.standard_error()?,
            pricer.fixed_beta(),
        ),
        _ => (stats.value.mean(), stats.value.standard_error()?, None),
    };

    if !price.is_finite() {
        return Err(PricingError::NumericalInstability {
            method: "Monte Carlo".to_string(),
            reason: format!("Price estimate is not finite: {}", price),
        });
    }

    let greeks = match pricer {
        Pricer::Pathwise(_) => Some(GreekEstimates {
            delta: greek_estimate(&stats.delta)?,
            vega: greek_estimate(&stats.vega)?,
        }),
        _ => None,
    };

    Ok(Estimate {
        price,
        stderr,
        replications: nreps,
        beta,
        greeks,
    })
}
