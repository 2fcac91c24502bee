//! # Portfolio Optimizers
//!
//! $$
//! \min_{\mathbf{w}} \ \lambda\,\mathbf{w}^\top\Sigma\mathbf{w}-\mu^\top\mathbf{w}
//! \quad\text{s.t.}\quad \mathbf{1}^\top\mathbf{w}=1,\ \mathbf{w}\ge 0
//! $$
//!
//! Long-only mean-variance formulation and weight post-processing.

use ndarray::Array1;
use ndarray::Array2;
use tracing::debug;
use tracing::warn;

use super::qp::LinearConstraint;
use super::qp::QpProblem;
use super::qp::QpSolver;
use crate::error::PortfolioError;
use crate::error::Result;

/// Weight sums with magnitude at or below this are left unscaled.
pub const NORMALIZE_TOL: f64 = 1e-10;

/// Build the fully-invested, long-only mean-variance QP for `(mu, sigma)`.
///
/// With the solver convention `½wᵀHw - fᵀw`, `H = 2λΣ` and `f = μ`.
pub fn mean_variance_problem(
  mu: &Array1<f64>,
  sigma: &Array2<f64>,
  lambda: f64,
) -> Result<QpProblem> {
  if !(lambda.is_finite() && lambda > 0.0) {
    return Err(PortfolioError::InvalidRiskAversion(lambda));
  }

  let p = mu.len();
  if p == 0 || sigma.dim() != (p, p) {
    return Err(PortfolioError::DimensionMismatch(format!(
      "mu has length {p} but sigma is {:?}",
      sigma.dim()
    )));
  }

  let h = sigma * (2.0 * lambda);
  let budget = LinearConstraint::new(Array1::ones(p), 1.0);
  let long_only = (0..p)
    .map(|i| {
      let mut e = Array1::zeros(p);
      e[i] = 1.0;
      LinearConstraint::new(e, 0.0)
    })
    .collect();

  Ok(QpProblem {
    h,
    f: mu.clone(),
    equalities: vec![budget],
    inequalities: long_only,
  })
}

/// Raw long-only mean-variance weights from `solver`.
pub fn optimize_mean_variance<S: QpSolver + ?Sized>(
  mu: &Array1<f64>,
  sigma: &Array2<f64>,
  lambda: f64,
  solver: &S,
) -> Result<Array1<f64>> {
  let problem = mean_variance_problem(mu, sigma, lambda)?;
  let w = solver.solve(&problem)?;
  debug!(
    objective = problem.objective(&w),
    sum = w.sum(),
    "mean-variance QP solved"
  );
  Ok(w)
}

/// Rescale `w` to sum to one unless the sum is numerically zero.
pub fn normalize_weights(w: Array1<f64>) -> Array1<f64> {
  let total = w.sum();
  if total.abs() > NORMALIZE_TOL {
    w / total
  } else {
    warn!(total, "weight sum is numerically zero, leaving weights unscaled");
    w
  }
}
