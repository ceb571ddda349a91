// scripts/asian_comparison.rs
//
// Prices a geometric Asian call with the pathwise and the control-variate
// engines and prints price, standard error and relative computation time.
//
// Usage: asian_comparison [--csv <file>]
// Engine settings honour ASIAN_MC_* environment overrides; RUST_LOG sets verbosity.
use asian_mc::analytics::asian_geometric;
use asian_mc::math_utils::Timer;
use asian_mc::output::{self, ComparisonRow};
use asian_mc::{EngineConfig, MarketData, MonteCarloEngine, OptionFacade, Payoff, PayoffKind, Pricer};
use std::env;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let csv_path = args
        .iter()
        .position(|a| a == "--csv")
        .and_then(|i| args.get(i + 1))
        .cloned();

    let (spot, rate, volatility, dividend) = (100.0, 0.06, 0.20, 0.03);
    let (expiry, strike) = (1.0, 100.0);
    let market = MarketData::new(rate, spot, volatility, dividend)?;

    let config = EngineConfig::from_env()?;
    println!(
        "Replications: {}  Steps: {}  Seed: {}  Worker threads: {} (of {} cores)",
        config.replications,
        config.steps,
        config.seed,
        config.worker_threads(),
        num_cpus::get()
    );

    let pathwise = MonteCarloEngine::new(config.clone(), Pricer::pathwise())?;
    let control_variate = MonteCarloEngine::new(config.clone(), Pricer::control_variate())?;

    let geometric = Payoff::new(expiry, strike, PayoffKind::GeometricAsianCall)?;
    let arithmetic = Payoff::new(expiry, strike, PayoffKind::ArithmeticAsianCall)?;

    let runs = [
        ("Pathwise Monte Carlo", OptionFacade::new(geometric.clone(), pathwise.clone(), market)),
        ("Geom. Asian M. Carlo", OptionFacade::new(geometric, control_variate.clone(), market)),
        ("Arith. Asian Pathwise", OptionFacade::new(arithmetic.clone(), pathwise, market)),
        ("Arith. Asian C.V.", OptionFacade::new(arithmetic, control_variate, market)),
    ];

    let mut rows = Vec::with_capacity(runs.len());
    let mut timer = Timer::new();
    for (label, option) in &runs {
        timer.start();
        let estimate = option.estimate()?;
        rows.push(ComparisonRow::new(label, &estimate, timer.elapsed_secs()));

        if let Some(delta) = estimate.greeks.and_then(|g| g.delta) {
            println!("{:<22} delta {:.4} ± {:.4}", label, delta.value, delta.stderr);
        }
    }

    println!();
    print!("{}", output::format_comparison_table(&rows));
    println!(
        "\nClosed-form geometric Asian call: {:.4}",
        asian_geometric::geometric_asian_call_price(&market, strike, expiry, config.steps)
    );

    if let Some(path) = csv_path {
        output::write_comparison_to_csv(&path, &rows)?;
        println!("Results written to {}", path);
    }
    Ok(())
}
