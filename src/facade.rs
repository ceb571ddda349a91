// src/facade.rs
use crate::error::PricingResult;
use crate::market::MarketData;
use crate::mc::mc_engine::{Estimate, MonteCarloEngine};
use crate::mc::payoffs::Payoff;

/// One option priced by one engine in one market
#[derive(Debug, Clone)]
pub struct OptionFacade {
    payoff: Payoff,
    engine: MonteCarloEngine,
    market: MarketData,
}

impl OptionFacade {
    pub fn new(payoff: Payoff, engine: MonteCarloEngine, market: MarketData) -> Self {
        OptionFacade {
            payoff,
            engine,
            market,
        }
    }

    /// `(price, standard_error)`
    pub fn price(&self) -> PricingResult<(f64, f64)> {
        Ok(self.estimate()?.as_tuple())
    }

    /// Full run result, including β and pathwise Greeks when available
    pub fn estimate(&self) -> PricingResult<Estimate> {
        self.engine.run(&self.market, &self.payoff)
    }

    pub fn payoff(&self) -> &Payoff {
        &self.payoff
    }

    pub fn engine(&self) -> &MonteCarloEngine {
        &self.engine
    }

    pub fn market(&self) -> &MarketData {
        &self.market
    }
}
