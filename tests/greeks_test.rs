// tests/greeks_test.rs
use asian_mc::analytics::{asian_geometric, bs_analytic};
use asian_mc::{
    EngineConfig, GreeksConfig, MarketData, MonteCarloEngine, PathEvaluator, Payoff, PayoffKind,
    Pricer,
};
use std::sync::Arc;

fn pathwise_engine(replications: usize, steps: usize) -> MonteCarloEngine {
    MonteCarloEngine::new(
        EngineConfig {
            replications,
            steps,
            seed: 42,
            ..Default::default()
        },
        Pricer::pathwise(),
    )
    .expect("valid engine")
}

#[test]
fn test_mc_delta_pathwise_vs_analytic() {
    let (s0, k, r, q, sigma, t) = (100.0, 100.0, 0.05, 0.02, 0.2, 1.0);
    let market = MarketData::new(r, s0, sigma, q).expect("valid market");
    let payoff = Payoff::new(t, k, PayoffKind::VanillaCall).expect("valid payoff");

    let estimate = pathwise_engine(200_000, 1)
        .run(&market, &payoff)
        .expect("pricing succeeds");
    let delta = estimate
        .greeks
        .and_then(|g| g.delta)
        .expect("pathwise delta requested");
    let analytic_delta = bs_analytic::bs_call_delta(s0, k, r, q, sigma, t);

    println!("\nMC Delta (Pathwise): {} ± {}", delta.value, delta.stderr);
    println!("Analytic Delta: {}", analytic_delta);

    assert!(
        (delta.value - analytic_delta).abs() < 4.0 * delta.stderr,
        "delta {} vs analytic {}",
        delta.value,
        analytic_delta
    );
}

#[test]
fn test_mc_vega_pathwise_vs_analytic() {
    let (s0, k, r, q, sigma, t) = (100.0, 100.0, 0.05, 0.0, 0.2, 1.0);
    let market = MarketData::new(r, s0, sigma, q).expect("valid market");
    let payoff = Payoff::new(t, k, PayoffKind::VanillaCall).expect("valid payoff");

    // multi-step grid exercises the accumulated Brownian record
    let estimate = pathwise_engine(200_000, 4)
        .run(&market, &payoff)
        .expect("pricing succeeds");
    let vega = estimate
        .greeks
        .and_then(|g| g.vega)
        .expect("pathwise vega requested");
    let analytic_vega = bs_analytic::bs_call_vega(s0, k, r, q, sigma, t);

    println!("\nMC Vega (Pathwise): {} ± {}", vega.value, vega.stderr);
    println!("Analytic Vega: {}", analytic_vega);

    assert!((vega.value - analytic_vega).abs() < 4.0 * vega.stderr);
}

#[test]
fn test_geometric_asian_greeks_vs_closed_form_differences() {
    let market = MarketData::new(0.06, 100.0, 0.2, 0.03).expect("valid market");
    let payoff = Payoff::new(1.0, 100.0, PayoffKind::GeometricAsianCall).expect("valid payoff");

    let estimate = pathwise_engine(100_000, 10)
        .run(&market, &payoff)
        .expect("pricing succeeds");
    let greeks = estimate.greeks.expect("pathwise greeks");
    let delta = greeks.delta.expect("delta requested");
    let vega = greeks.vega.expect("vega requested");

    let price = |m: &MarketData| asian_geometric::geometric_asian_call_price(m, 100.0, 1.0, 10);
    let h = 1e-4;
    let fd_delta = (price(&market.with_spot(100.0 + h).expect("valid bump"))
        - price(&market.with_spot(100.0 - h).expect("valid bump")))
        / (2.0 * h);
    let fd_vega = (price(&market.with_volatility(0.2 + h).expect("valid bump"))
        - price(&market.with_volatility(0.2 - h).expect("valid bump")))
        / (2.0 * h);

    println!("\nAsian delta: {} ± {} (closed form {})", delta.value, delta.stderr, fd_delta);
    println!("Asian vega: {} ± {} (closed form {})", vega.value, vega.stderr, fd_vega);

    assert!((delta.value - fd_delta).abs() < 4.0 * delta.stderr);
    assert!((vega.value - fd_vega).abs() < 4.0 * vega.stderr);
}

struct ArithmeticAverageCall;

impl PathEvaluator for ArithmeticAverageCall {
    fn name(&self) -> &str {
        "user arithmetic call"
    }

    fn evaluate(&self, path: &[f64], strike: f64) -> f64 {
        let fixings = &path[1..];
        (fixings.iter().sum::<f64>() / fixings.len() as f64 - strike).max(0.0)
    }
}

#[test]
fn test_custom_evaluator_greeks_track_builtin() {
    let market = MarketData::new(0.06, 100.0, 0.2, 0.03).expect("valid market");
    let builtin = Payoff::new(1.0, 100.0, PayoffKind::ArithmeticAsianCall).expect("valid payoff");
    let custom =
        Payoff::custom(1.0, 100.0, Arc::new(ArithmeticAverageCall)).expect("valid payoff");

    let engine = pathwise_engine(20_000, 10);
    let a = engine.run(&market, &builtin).expect("pricing succeeds");
    let b = engine.run(&market, &custom).expect("pricing succeeds");

    // identical draws, identical payoff values
    assert!((a.price - b.price).abs() < 1e-10);

    let (ga, gb) = (a.greeks.expect("greeks"), b.greeks.expect("greeks"));
    let (da, db) = (ga.delta.expect("delta"), gb.delta.expect("delta"));
    // bumps only disagree on the handful of paths straddling the strike
    assert!((da.value - db.value).abs() < da.stderr, "{} vs {}", da.value, db.value);
}

#[test]
fn test_delta_only_selection() {
    let market = MarketData::new(0.06, 100.0, 0.2, 0.03).expect("valid market");
    let payoff = Payoff::new(1.0, 100.0, PayoffKind::ArithmeticAsianPut).expect("valid payoff");
    let engine = MonteCarloEngine::with_defaults(5_000, 10, Pricer::Pathwise(GreeksConfig::DELTA))
        .expect("valid engine");

    let greeks = engine
        .run(&market, &payoff)
        .expect("pricing succeeds")
        .greeks
        .expect("pathwise greeks");
    let delta = greeks.delta.expect("delta requested");
    assert!(delta.value < 0.0 && delta.value > -1.0, "put delta = {}", delta.value);
    assert!(greeks.vega.is_none());
}
