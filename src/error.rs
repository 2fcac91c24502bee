//! # Errors
//!
//! Failure taxonomy shared by every stage of the allocation pipeline. None of
//! these conditions is transient, so nothing in the crate retries.

use thiserror::Error;

use crate::quant::portfolio::qp::QpFailure;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, PortfolioError>;

#[derive(Debug, Error)]
pub enum PortfolioError {
  /// The return table is empty, ragged or holds a non-numeric cell.
  #[error("malformed return table: {0}")]
  MalformedTable(String),

  /// Posterior degrees of freedom leave `nu_n - p - 1` non-positive.
  #[error("degenerate degrees of freedom: nu_n = {nu_n} with p = {p} assets (need nu_n > p + 1)")]
  DegenerateDegreesOfFreedom { nu_n: f64, p: usize },

  /// Risk aversion must be strictly positive and finite.
  #[error("invalid risk aversion lambda = {0} (must be > 0)")]
  InvalidRiskAversion(f64),

  #[error("invalid NIW prior: {0}")]
  InvalidPrior(String),

  #[error("dimension mismatch: {0}")]
  DimensionMismatch(String),

  #[error("QP solver reported the problem infeasible")]
  SolverInfeasible,

  #[error("QP solver reported the problem unbounded")]
  SolverUnbounded,

  #[error("QP solver failed: {0}")]
  Solver(QpFailure),

  /// Realized portfolio returns have zero dispersion, so the Sharpe ratio is undefined.
  #[error("zero volatility (expected return {expected_return}); Sharpe ratio is undefined")]
  ZeroVolatility { expected_return: f64 },

  #[error(transparent)]
  Io(#[from] std::io::Error),
}

impl From<QpFailure> for PortfolioError {
  fn from(failure: QpFailure) -> Self {
    match failure {
      QpFailure::Infeasible => Self::SolverInfeasible,
      QpFailure::Unbounded => Self::SolverUnbounded,
      other => Self::Solver(other),
    }
  }
}
