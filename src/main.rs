use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use bayesian_portfolio::io::load_return_table;
use bayesian_portfolio::io::save_weights;
use bayesian_portfolio::quant::portfolio::PortfolioEngine;
use bayesian_portfolio::quant::portfolio::PortfolioEngineConfig;
use bayesian_portfolio::quant::portfolio::SolverBackend;
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "bayesian-portfolio")]
#[command(about = "NIW posterior estimate + long-only mean-variance allocation")]
struct Cli {
  /// Header-less CSV of per-period asset returns (rows = periods)
  #[arg(short, long, default_value = "data/returns.csv")]
  input: PathBuf,

  /// Where to write the final weights, one per line
  #[arg(short, long, default_value = "weights.csv")]
  output: PathBuf,

  /// Risk aversion of the mean-variance objective
  #[arg(short, long, default_value_t = 10.0)]
  lambda: f64,

  /// QP backend
  #[arg(long, value_enum, default_value = "pgd")]
  solver: SolverBackend,

  /// Prior confidence in the prior mean
  #[arg(long)]
  kappa0: Option<f64>,

  /// Prior degrees of freedom (default: assets + 2)
  #[arg(long)]
  nu0: Option<f64>,
}

fn main() -> Result<()> {
  tracing_subscriber::registry()
    .with(tracing_subscriber::fmt::layer())
    .with(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  let cli = Cli::parse();

  let returns = load_return_table(&cli.input)
    .with_context(|| format!("failed to load returns from {}", cli.input.display()))?;

  let engine = PortfolioEngine::new(PortfolioEngineConfig {
    risk_aversion: cli.lambda,
    solver: cli.solver,
    prior: None,
    prior_kappa0: cli.kappa0,
    prior_nu0: cli.nu0,
  });
  let report = engine.run(&returns).context("allocation failed")?;

  save_weights(&cli.output, &report.weights)
    .with_context(|| format!("failed to write weights to {}", cli.output.display()))?;

  let weights: Vec<String> = report.weights.iter().map(|w| format!("{w:.6}")).collect();
  println!("Weights:\n{}", weights.join(" "));
  match report.metrics {
    Some(m) => println!(
      "Expected Return: {}, Volatility: {}, Sharpe: {}",
      m.expected_return, m.volatility, m.sharpe_ratio
    ),
    None => println!(
      "Expected Return: {}, Volatility: 0, Sharpe: undefined",
      report.expected_return
    ),
  }

  Ok(())
}
