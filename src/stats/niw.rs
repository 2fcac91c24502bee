//! # Normal-Inverse-Wishart Posterior
//!
//! $$
//! \kappa_n=\kappa_0+n,\quad
//! \mu_n=\frac{\kappa_0\mu_0+n\bar y}{\kappa_n},\quad
//! \Psi_n=\Psi_0+S+\frac{\kappa_0 n}{\kappa_n}(\bar y-\mu_0)(\bar y-\mu_0)^\top
//! $$
//!
//! Conjugate update of a NIW prior on the mean and covariance of asset returns.
//! The point estimate of the covariance is the inverse-Wishart mean
//! $\Sigma_n = \Psi_n / (\nu_n - p - 1)$.

use nalgebra::DMatrix;
use ndarray::Array1;
use ndarray::Array2;
use tracing::debug;

use crate::error::PortfolioError;
use crate::error::Result;
use crate::quant::portfolio::data::ReturnMatrix;
use crate::quant::portfolio::data::symmetrize;

const SYMMETRY_TOL: f64 = 1e-10;

/// NIW prior hyperparameters.
#[derive(Clone, Debug)]
pub struct NiwPrior {
  mu0: Array1<f64>,
  kappa0: f64,
  psi0: Array2<f64>,
  nu0: f64,
}

impl NiwPrior {
  /// Validate and build a prior.
  ///
  /// `psi0` must be symmetric positive-definite, `kappa0 > 0` and `nu0 > p - 1`.
  pub fn new(mu0: Array1<f64>, kappa0: f64, psi0: Array2<f64>, nu0: f64) -> Result<Self> {
    let p = mu0.len();
    if p == 0 {
      return Err(PortfolioError::InvalidPrior("mu0 is empty".into()));
    }
    if mu0.iter().any(|v| !v.is_finite()) {
      return Err(PortfolioError::InvalidPrior("mu0 has non-finite entries".into()));
    }
    if !(kappa0.is_finite() && kappa0 > 0.0) {
      return Err(PortfolioError::InvalidPrior(format!(
        "kappa0 = {kappa0} must be positive"
      )));
    }
    if psi0.dim() != (p, p) {
      return Err(PortfolioError::InvalidPrior(format!(
        "psi0 is {:?}, expected {p}x{p} to match mu0",
        psi0.dim()
      )));
    }
    if !(nu0.is_finite() && nu0 > p as f64 - 1.0) {
      return Err(PortfolioError::InvalidPrior(format!(
        "nu0 = {nu0} must exceed p - 1 = {}",
        p as f64 - 1.0
      )));
    }
    check_spd(&psi0)?;

    Ok(Self {
      mu0,
      kappa0,
      psi0,
      nu0,
    })
  }

  /// Weakly informative prior for `p` assets: zero mean, unit confidence,
  /// identity scale and `nu0 = p + 2`.
  pub fn uninformative(p: usize) -> Result<Self> {
    Self::new(
      Array1::zeros(p),
      1.0,
      Array2::eye(p),
      p as f64 + 2.0,
    )
  }

  pub fn mu0(&self) -> &Array1<f64> {
    &self.mu0
  }

  pub fn kappa0(&self) -> f64 {
    self.kappa0
  }

  pub fn psi0(&self) -> &Array2<f64> {
    &self.psi0
  }

  pub fn nu0(&self) -> f64 {
    self.nu0
  }

  /// Number of assets the prior is defined over.
  pub fn dim(&self) -> usize {
    self.mu0.len()
  }

  /// Same prior with a different mean confidence.
  pub fn with_kappa0(self, kappa0: f64) -> Result<Self> {
    Self::new(self.mu0, kappa0, self.psi0, self.nu0)
  }

  /// Same prior with different degrees of freedom.
  pub fn with_nu0(self, nu0: f64) -> Result<Self> {
    Self::new(self.mu0, self.kappa0, self.psi0, nu0)
  }

  /// Conjugate update against an observed return table.
  pub fn update(&self, returns: &ReturnMatrix) -> Result<NiwPosterior> {
    update(returns, self)
  }
}

fn check_spd(psi0: &Array2<f64>) -> Result<()> {
  let p = psi0.nrows();
  for i in 0..p {
    for j in (i + 1)..p {
      let (a, b) = (psi0[[i, j]], psi0[[j, i]]);
      let scale = a.abs().max(b.abs()).max(1.0);
      if !a.is_finite() || !b.is_finite() || (a - b).abs() > SYMMETRY_TOL * scale {
        return Err(PortfolioError::InvalidPrior(format!(
          "psi0 is not symmetric at ({i}, {j})"
        )));
      }
    }
  }

  let m = DMatrix::from_fn(p, p, |i, j| psi0[[i, j]]);
  if m.cholesky().is_none() {
    return Err(PortfolioError::InvalidPrior(
      "psi0 is not positive-definite".into(),
    ));
  }

  Ok(())
}

/// Posterior hyperparameters together with the covariance point estimate.
#[derive(Clone, Debug)]
pub struct NiwPosterior {
  /// Posterior mean of returns.
  pub mu_n: Array1<f64>,
  pub kappa_n: f64,
  /// Posterior scale matrix.
  pub psi_n: Array2<f64>,
  pub nu_n: f64,
  /// Posterior covariance estimate `psi_n / (nu_n - p - 1)`.
  pub sigma_n: Array2<f64>,
}

/// Closed-form NIW update of `prior` with the observations in `returns`.
///
/// Fails with [`PortfolioError::DegenerateDegreesOfFreedom`] when
/// `nu0 + n <= p + 1`.
pub fn update(returns: &ReturnMatrix, prior: &NiwPrior) -> Result<NiwPosterior> {
  let n = returns.n_obs();
  let p = returns.n_assets();
  if prior.dim() != p {
    return Err(PortfolioError::DimensionMismatch(format!(
      "prior is {}-dimensional but the return table has {p} assets",
      prior.dim()
    )));
  }

  let nf = n as f64;
  let kappa_n = prior.kappa0 + nf;
  let nu_n = prior.nu0 + nf;
  let denom = nu_n - p as f64 - 1.0;
  if denom <= 0.0 {
    return Err(PortfolioError::DegenerateDegreesOfFreedom { nu_n, p });
  }

  let ybar = returns.column_means();
  let scatter = returns.scatter_matrix(&ybar);

  let diff = &ybar - &prior.mu0;
  let shrink = prior.kappa0 * nf / kappa_n;
  let mut psi_n = &prior.psi0 + &scatter;
  for i in 0..p {
    for j in 0..p {
      psi_n[[i, j]] += shrink * diff[i] * diff[j];
    }
  }
  symmetrize(&mut psi_n);

  let mu_n = (&prior.mu0 * prior.kappa0 + &ybar * nf) / kappa_n;
  let sigma_n = &psi_n / denom;

  debug!(n, p, kappa_n, nu_n, "NIW posterior updated");

  Ok(NiwPosterior {
    mu_n,
    kappa_n,
    psi_n,
    nu_n,
    sigma_n,
  })
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use ndarray::array;

  use super::*;

  fn sample_returns() -> ReturnMatrix {
    ReturnMatrix::new(array![[0.02, 0.01], [0.04, -0.01], [-0.01, 0.03]]).unwrap()
  }

  fn wider_returns() -> ReturnMatrix {
    ReturnMatrix::new(array![
      [0.012, -0.004, 0.021],
      [-0.007, 0.015, 0.003],
      [0.025, 0.002, -0.011],
      [0.001, 0.009, 0.017],
      [-0.014, -0.006, 0.008],
      [0.019, 0.011, -0.002],
    ])
    .unwrap()
  }

  #[test]
  fn closed_form_two_asset_scenario() {
    let prior = NiwPrior::new(array![0.0, 0.0], 1.0, Array2::eye(2), 4.0).unwrap();
    let post = update(&sample_returns(), &prior).unwrap();

    assert_abs_diff_eq!(post.kappa_n, 4.0);
    assert_abs_diff_eq!(post.nu_n, 7.0);
    assert_abs_diff_eq!(post.mu_n, array![0.0125, 0.0075], epsilon = 1e-12);

    // psi_n = I + S + 3/4 * ybar ybarᵀ, ybar = (1/60, 1/100)
    let psi_11 = 1.0 + 114.0 / 90_000.0 + 0.75 / 3600.0;
    let psi_22 = 1.0 + 0.0008 + 0.75 / 10_000.0;
    let psi_12 = -0.001 + 0.75 / 6000.0;
    let expected_psi = array![[psi_11, psi_12], [psi_12, psi_22]];
    assert_abs_diff_eq!(post.psi_n, expected_psi, epsilon = 1e-12);
    assert_abs_diff_eq!(post.sigma_n, expected_psi / 4.0, epsilon = 1e-12);
    assert_abs_diff_eq!(post.sigma_n[[0, 0]], 0.25036875, epsilon = 1e-12);
    assert_abs_diff_eq!(post.sigma_n[[0, 1]], -0.00021875, epsilon = 1e-12);
  }

  #[test]
  fn posterior_covariance_is_symmetric() {
    let returns = wider_returns();
    let prior = NiwPrior::new(
      array![0.01, 0.0, -0.005],
      2.5,
      array![[1.0, 0.2, 0.1], [0.2, 0.8, 0.05], [0.1, 0.05, 0.5]],
      6.0,
    )
    .unwrap();
    let post = prior.update(&returns).unwrap();

    assert_abs_diff_eq!(post.sigma_n, post.sigma_n.t(), epsilon = 1e-15);
  }

  #[test]
  fn row_order_does_not_matter() {
    let returns = wider_returns();
    let mut rows: Vec<Vec<f64>> = returns.view().rows().into_iter().map(|r| r.to_vec()).collect();
    rows.reverse();
    rows.swap(0, 3);
    let permuted = ReturnMatrix::from_rows(&rows).unwrap();

    let prior = NiwPrior::uninformative(3).unwrap();
    let a = update(&returns, &prior).unwrap();
    let b = update(&permuted, &prior).unwrap();

    assert_abs_diff_eq!(a.mu_n, b.mu_n, epsilon = 1e-12);
    assert_abs_diff_eq!(a.sigma_n, b.sigma_n, epsilon = 1e-12);
  }

  #[test]
  fn kappa0_interpolates_between_prior_and_data() {
    let returns = sample_returns();
    let mu0 = array![0.05, -0.02];
    let ybar = returns.column_means();

    let strong = NiwPrior::new(mu0.clone(), 1e12, Array2::eye(2), 4.0).unwrap();
    let post = update(&returns, &strong).unwrap();
    assert_abs_diff_eq!(post.mu_n, mu0, epsilon = 1e-9);

    let weak = NiwPrior::new(mu0, 1e-12, Array2::eye(2), 4.0).unwrap();
    let post = update(&returns, &weak).unwrap();
    assert_abs_diff_eq!(post.mu_n, ybar, epsilon = 1e-9);
  }

  #[test]
  fn boundary_degrees_of_freedom_are_rejected() {
    // nu0 + n = 2 + 1 = p + 1
    let returns = ReturnMatrix::new(array![[0.01, 0.02]]).unwrap();
    let prior = NiwPrior::new(array![0.0, 0.0], 1.0, Array2::eye(2), 2.0).unwrap();

    match update(&returns, &prior) {
      Err(PortfolioError::DegenerateDegreesOfFreedom { nu_n, p }) => {
        assert_eq!(nu_n, 3.0);
        assert_eq!(p, 2);
      }
      other => panic!("expected DegenerateDegreesOfFreedom, got {other:?}"),
    }
  }

  #[test]
  fn prior_dimension_must_match_assets() {
    let prior = NiwPrior::uninformative(3).unwrap();
    assert!(matches!(
      update(&sample_returns(), &prior),
      Err(PortfolioError::DimensionMismatch(_))
    ));
  }

  #[test]
  fn invalid_priors_are_rejected() {
    let eye = Array2::<f64>::eye(2);
    assert!(NiwPrior::new(array![0.0, 0.0], 0.0, eye.clone(), 4.0).is_err());
    assert!(NiwPrior::new(array![0.0, 0.0], 1.0, eye.clone(), 1.0).is_err());
    assert!(NiwPrior::new(array![0.0, 0.0, 0.0], 1.0, eye.clone(), 4.0).is_err());
    assert!(NiwPrior::new(array![0.0, 0.0], 1.0, array![[1.0, 0.5], [0.0, 1.0]], 4.0).is_err());
    // symmetric but indefinite
    assert!(NiwPrior::new(array![0.0, 0.0], 1.0, array![[1.0, 2.0], [2.0, 1.0]], 4.0).is_err());
  }

  #[test]
  fn uninformative_prior_defaults() {
    let prior = NiwPrior::uninformative(4).unwrap();
    assert_eq!(prior.dim(), 4);
    assert_eq!(prior.kappa0(), 1.0);
    assert_eq!(prior.nu0(), 6.0);
    assert_eq!(prior.psi0(), &Array2::<f64>::eye(4));
    assert!(prior.mu0().iter().all(|&v| v == 0.0));
  }
}
