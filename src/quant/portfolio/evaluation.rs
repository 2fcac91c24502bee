//! # Portfolio Evaluation
//!
//! $$
//! r_{p,t}=\mathbf{r}_t^\top\mathbf{w},\quad
//! \sigma_p=\sqrt{\tfrac1n\sum_t (r_{p,t}-\bar r_p)^2}
//! $$
//!
//! In-sample diagnostics of a weight vector.

use ndarray::Array1;

use super::data::ReturnMatrix;
use super::types::EvaluationMetrics;
use crate::error::PortfolioError;
use crate::error::Result;

/// Per-period portfolio returns `R · w`.
pub fn portfolio_returns(returns: &ReturnMatrix, w: &Array1<f64>) -> Result<Array1<f64>> {
  if w.len() != returns.n_assets() {
    return Err(PortfolioError::DimensionMismatch(format!(
      "{} weights for {} assets",
      w.len(),
      returns.n_assets()
    )));
  }
  Ok(returns.view().dot(w))
}

/// Mean, population volatility and Sharpe ratio of the realized portfolio returns.
///
/// Zero volatility is reported as [`PortfolioError::ZeroVolatility`] carrying the mean.
/// It is detected from the returns themselves (all periods identical), not from a
/// threshold on the computed volatility, whose rounding noise scales with the level.
pub fn evaluate(returns: &ReturnMatrix, w: &Array1<f64>) -> Result<EvaluationMetrics> {
  let port_ret = portfolio_returns(returns, w)?;
  let n = port_ret.len() as f64;
  let flat = port_ret.iter().all(|&r| r == port_ret[0]);

  let expected_return = port_ret.sum() / n;
  let variance = port_ret
    .iter()
    .map(|r| (r - expected_return).powi(2))
    .sum::<f64>()
    / n;
  let volatility = variance.sqrt();

  if flat || volatility == 0.0 {
    return Err(PortfolioError::ZeroVolatility { expected_return });
  }

  Ok(EvaluationMetrics {
    expected_return,
    volatility,
    sharpe_ratio: expected_return / volatility,
  })
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use ndarray::Array2;
  use ndarray::Axis;
  use ndarray::array;

  use super::*;

  #[test]
  fn uniform_weights_average_row_means() {
    let r = ReturnMatrix::new(array![
      [0.02, 0.01, -0.03],
      [0.04, -0.01, 0.0],
      [-0.01, 0.03, 0.02],
      [0.005, 0.002, 0.011],
    ])
    .unwrap();
    let w = Array1::from_elem(3, 1.0 / 3.0);
    let metrics = evaluate(&r, &w).unwrap();

    let row_means = r.view().mean_axis(Axis(1)).unwrap();
    assert_abs_diff_eq!(metrics.expected_return, row_means.mean().unwrap(), epsilon = 1e-15);
  }

  #[test]
  fn population_volatility_and_sharpe() {
    let r = ReturnMatrix::new(array![[0.02, 0.01], [0.04, -0.01], [-0.01, 0.03]]).unwrap();
    let w = array![0.5, 0.5];
    let metrics = evaluate(&r, &w).unwrap();

    // portfolio returns 0.015, 0.015, 0.010
    let mean: f64 = 0.04 / 3.0;
    let var = (2.0 * (0.015 - mean).powi(2) + (0.010 - mean).powi(2)) / 3.0;
    assert_abs_diff_eq!(metrics.expected_return, mean, epsilon = 1e-15);
    assert_abs_diff_eq!(metrics.volatility, var.sqrt(), epsilon = 1e-15);
    assert_abs_diff_eq!(metrics.sharpe_ratio, mean / var.sqrt(), epsilon = 1e-9);
  }

  #[test]
  fn constant_portfolio_returns_signal_zero_volatility() {
    let r = ReturnMatrix::new(array![[0.1, 0.1], [0.1, 0.1], [0.1, 0.1]]).unwrap();
    match evaluate(&r, &array![0.3, 0.7]) {
      Err(PortfolioError::ZeroVolatility { expected_return }) => {
        assert_abs_diff_eq!(expected_return, 0.1, epsilon = 1e-15);
      }
      other => panic!("expected ZeroVolatility, got {other:?}"),
    }
  }

  #[test]
  fn large_constant_returns_signal_zero_volatility() {
    // rounding in the mean leaves ~1e-15 of spurious dispersion at this level
    let r = ReturnMatrix::new(Array2::from_elem((7, 2), 7.3)).unwrap();
    match evaluate(&r, &array![0.37, 0.63]) {
      Err(PortfolioError::ZeroVolatility { expected_return }) => {
        assert_abs_diff_eq!(expected_return, 7.3, epsilon = 1e-12);
      }
      other => panic!("expected ZeroVolatility, got {other:?}"),
    }
  }

  #[test]
  fn small_genuine_dispersion_is_not_zero_volatility() {
    let r = ReturnMatrix::new(array![[1e-9], [-1e-9], [1e-9], [-1e-9]]).unwrap();
    let metrics = evaluate(&r, &array![1.0]).unwrap();
    assert_abs_diff_eq!(metrics.volatility, 1e-9, epsilon = 1e-20);
    assert_abs_diff_eq!(metrics.sharpe_ratio, 0.0, epsilon = 1e-12);
  }

  #[test]
  fn weight_length_must_match_assets() {
    let r = ReturnMatrix::new(array![[0.1, 0.2]]).unwrap();
    assert!(matches!(
      evaluate(&r, &array![1.0]),
      Err(PortfolioError::DimensionMismatch(_))
    ));
  }
}
