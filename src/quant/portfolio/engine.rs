//! # Portfolio Engine
//!
//! $$
//! R \xrightarrow{\text{NIW}} (\mu_n,\Sigma_n) \xrightarrow{\text{QP}} \mathbf{w}
//! \xrightarrow{\text{normalize}} \hat{\mathbf{w}} \xrightarrow{\text{evaluate}} (\bar r_p,\sigma_p,SR)
//! $$
//!
//! High-level orchestration of the Bayesian allocation pipeline.

use tracing::info;
use tracing::warn;

use super::data::ReturnMatrix;
use super::evaluation::evaluate;
use super::optimizers::normalize_weights;
use super::optimizers::optimize_mean_variance;
use super::types::AllocationReport;
use super::types::SolverBackend;
use crate::error::PortfolioError;
use crate::error::Result;
use crate::stats::niw::NiwPrior;

/// Runtime configuration for [`PortfolioEngine`].
#[derive(Clone, Debug)]
pub struct PortfolioEngineConfig {
  /// Risk aversion `λ` of the mean-variance objective.
  pub risk_aversion: f64,
  /// QP backend.
  pub solver: SolverBackend,
  /// Explicit prior; when absent the uninformative prior for the asset count is used.
  pub prior: Option<NiwPrior>,
  /// Override of `kappa0` for the default prior; ignored (with a warning) when `prior` is set.
  pub prior_kappa0: Option<f64>,
  /// Override of `nu0` for the default prior; ignored (with a warning) when `prior` is set.
  pub prior_nu0: Option<f64>,
}

impl Default for PortfolioEngineConfig {
  fn default() -> Self {
    Self {
      risk_aversion: 1.0,
      solver: SolverBackend::ProjectedGradient,
      prior: None,
      prior_kappa0: None,
      prior_nu0: None,
    }
  }
}

/// Single entry point for the estimate-optimize-evaluate workflow.
#[derive(Clone, Debug)]
pub struct PortfolioEngine {
  config: PortfolioEngineConfig,
}

impl PortfolioEngine {
  /// Construct a new engine with explicit configuration.
  pub fn new(config: PortfolioEngineConfig) -> Self {
    Self { config }
  }

  /// Borrow engine configuration.
  pub fn config(&self) -> &PortfolioEngineConfig {
    &self.config
  }

  /// Prior used for a table with `p` assets.
  pub fn prior_for(&self, p: usize) -> Result<NiwPrior> {
    if let Some(prior) = &self.config.prior {
      if self.config.prior_kappa0.is_some() || self.config.prior_nu0.is_some() {
        warn!(
          kappa0 = self.config.prior_kappa0,
          nu0 = self.config.prior_nu0,
          "explicit prior set; kappa0/nu0 overrides ignored"
        );
      }
      return Ok(prior.clone());
    }

    let mut prior = NiwPrior::uninformative(p)?;
    if let Some(kappa0) = self.config.prior_kappa0 {
      prior = prior.with_kappa0(kappa0)?;
    }
    if let Some(nu0) = self.config.prior_nu0 {
      prior = prior.with_nu0(nu0)?;
    }
    Ok(prior)
  }

  /// Run posterior update, optimization, normalization and evaluation.
  pub fn run(&self, returns: &ReturnMatrix) -> Result<AllocationReport> {
    let prior = self.prior_for(returns.n_assets())?;
    let posterior = prior.update(returns)?;

    let solver = self.config.solver.solver();
    let raw_weights = optimize_mean_variance(
      &posterior.mu_n,
      &posterior.sigma_n,
      self.config.risk_aversion,
      solver.as_ref(),
    )?;
    let weights = normalize_weights(raw_weights.clone());

    let (metrics, expected_return) = match evaluate(returns, &weights) {
      Ok(m) => (Some(m), m.expected_return),
      Err(PortfolioError::ZeroVolatility { expected_return }) => {
        warn!(expected_return, "realized volatility is zero; Sharpe ratio undefined");
        (None, expected_return)
      }
      Err(e) => return Err(e),
    };

    info!(
      n = returns.n_obs(),
      p = returns.n_assets(),
      lambda = self.config.risk_aversion,
      expected_return,
      volatility = metrics.map(|m| m.volatility),
      sharpe = metrics.map(|m| m.sharpe_ratio),
      "allocation complete"
    );

    Ok(AllocationReport {
      posterior,
      raw_weights,
      weights,
      metrics,
      expected_return,
    })
  }
}
