//! # Portfolio Types
//!
//! $$
//! SR = \frac{\mathbb E[R_p]}{\sigma_p}
//! $$
//!
//! Shared enums and result containers for the allocation pipeline.

use clap::ValueEnum;
use ndarray::Array1;

use super::qp::ClarabelSolver;
use super::qp::ProjectedGradientSolver;
use super::qp::QpSolver;
use crate::stats::niw::NiwPosterior;

/// Supported QP backends.
///
/// Parsed by name through [`ValueEnum`]; unknown names are an error.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum SolverBackend {
  /// Accelerated projected gradient on the budget simplex.
  #[default]
  #[value(name = "pgd")]
  ProjectedGradient,
  /// Clarabel interior-point solver.
  #[value(name = "clarabel", alias = "ipm")]
  Clarabel,
}

impl SolverBackend {
  /// Instantiate the backend with default settings.
  pub fn solver(self) -> Box<dyn QpSolver> {
    match self {
      Self::ProjectedGradient => Box::new(ProjectedGradientSolver::default()),
      Self::Clarabel => Box::new(ClarabelSolver::default()),
    }
  }
}

/// Realized performance of a weight vector over the return history.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EvaluationMetrics {
  /// Mean per-period portfolio return.
  pub expected_return: f64,
  /// Population standard deviation of per-period portfolio returns.
  pub volatility: f64,
  /// `expected_return / volatility`.
  pub sharpe_ratio: f64,
}

impl EvaluationMetrics {
  /// Sharpe ratio against a per-period risk-free rate; `None` when volatility is zero.
  pub fn excess_sharpe(&self, risk_free: f64) -> Option<f64> {
    if self.volatility == 0.0 {
      return None;
    }
    Some((self.expected_return - risk_free) / self.volatility)
  }
}

/// Output of a full pipeline run.
#[derive(Clone, Debug)]
pub struct AllocationReport {
  pub posterior: NiwPosterior,
  /// Direct QP output.
  pub raw_weights: Array1<f64>,
  /// Weights rescaled to sum to one.
  pub weights: Array1<f64>,
  /// `None` when realized volatility is zero and the Sharpe ratio is undefined.
  pub metrics: Option<EvaluationMetrics>,
  /// Mean realized portfolio return, available even when `metrics` is not.
  pub expected_return: f64,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn parse(name: &str) -> Result<SolverBackend, String> {
    <SolverBackend as ValueEnum>::from_str(name, true)
  }

  #[test]
  fn backend_parsing_by_name() {
    assert_eq!(parse("Clarabel"), Ok(SolverBackend::Clarabel));
    assert_eq!(parse("ipm"), Ok(SolverBackend::Clarabel));
    assert_eq!(parse("pgd"), Ok(SolverBackend::ProjectedGradient));
  }

  #[test]
  fn unknown_backend_is_rejected() {
    assert!(parse("clarable").is_err());
    assert!(parse("???").is_err());
  }

  #[test]
  fn excess_sharpe_subtracts_risk_free() {
    let m = EvaluationMetrics {
      expected_return: 0.03,
      volatility: 0.1,
      sharpe_ratio: 0.3,
    };
    assert!((m.excess_sharpe(0.01).unwrap() - 0.2).abs() < 1e-12);
    assert!((m.excess_sharpe(0.0).unwrap() - m.sharpe_ratio).abs() < 1e-12);
  }

  #[test]
  fn excess_sharpe_is_undefined_without_volatility() {
    let m = EvaluationMetrics {
      expected_return: 0.03,
      volatility: 0.0,
      sharpe_ratio: f64::NAN,
    };
    assert_eq!(m.excess_sharpe(0.01), None);
  }
}
