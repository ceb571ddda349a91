//! # asian-mc: Monte Carlo Pricing of Asian Options
//!
//! Prices arithmetic and geometric Asian options (and vanilla options) under
//! Black-Scholes dynamics with Monte Carlo simulation and variance reduction.
//!
//! ## Key Features
//!
//! - **Three estimators**: naive, pathwise (with delta/vega), and control
//!   variate using the closed-form geometric Asian as control
//! - **Reproducible parallelism**: per-replication RNG substreams and a fixed
//!   batch reduction order give bit-identical results on any thread count
//! - **Pluggable payoffs**: built-in shapes plus user evaluators via [`PathEvaluator`]
//!
//! ## Quick Start
//!
//! ```rust
//! use asian_mc::{MarketData, MonteCarloEngine, OptionFacade, Payoff, PayoffKind, Pricer};
//!
//! let market = MarketData::new(0.06, 100.0, 0.20, 0.03).expect("valid market");
//! let payoff = Payoff::new(1.0, 100.0, PayoffKind::ArithmeticAsianCall).expect("valid payoff");
//! let engine = MonteCarloEngine::with_defaults(10_000, 10, Pricer::control_variate())
//!     .expect("valid engine");
//!
//! let option = OptionFacade::new(payoff, engine, market);
//! let (price, stderr) = option.price().expect("pricing succeeds");
//! println!("Asian call: {:.4} ± {:.4}", price, stderr);
//! ```
//!
//! ## Mathematical Foundation
//!
//! Paths follow the exact GBM solution under the risk-neutral measure; each
//! replication yields one discounted payoff sample and the engine reports
//! the sample mean with its standard error `s/√n`.

pub mod analytics;
pub mod config;
pub mod error;
pub mod facade;
pub mod market;
pub mod math_utils;
pub mod mc;
pub mod models;
pub mod output;
pub mod rng;

pub use config::EngineConfig;
pub use error::{PricingError, PricingResult};
pub use facade::OptionFacade;
pub use market::MarketData;
pub use mc::mc_engine::{Estimate, GreekEstimate, GreekEstimates, MonteCarloEngine};
pub use mc::payoffs::{ControlKind, PathEvaluator, Payoff, PayoffKind};
pub use mc::pricers::{ControlCoefficient, GreeksConfig, Pricer, Replication};
pub use models::gbm::{GbmPathGenerator, SimulatedPath};
