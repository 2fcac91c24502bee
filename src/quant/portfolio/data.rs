//! # Portfolio Data
//!
//! $$
//! S = \sum_{i=1}^{n} (\mathbf{r}_i-\bar{\mathbf{r}})(\mathbf{r}_i-\bar{\mathbf{r}})^\top
//! $$
//!
//! Validated return table and the sufficient statistics derived from it.

use ndarray::Array1;
use ndarray::Array2;
use ndarray::ArrayView2;
use ndarray::Axis;

use crate::error::PortfolioError;
use crate::error::Result;

/// Immutable `n x p` table of per-period asset returns (rows are observations).
#[derive(Clone, Debug, PartialEq)]
pub struct ReturnMatrix {
  data: Array2<f64>,
}

impl ReturnMatrix {
  /// Wrap a dense array, rejecting empty or non-finite tables.
  pub fn new(data: Array2<f64>) -> Result<Self> {
    let (n, p) = data.dim();
    if n == 0 || p == 0 {
      return Err(PortfolioError::MalformedTable(format!(
        "expected at least one observation and one asset, got {n}x{p}"
      )));
    }

    if let Some(((i, j), v)) = data.indexed_iter().find(|(_, v)| !v.is_finite()) {
      return Err(PortfolioError::MalformedTable(format!(
        "non-finite value {v} at row {i}, column {j}"
      )));
    }

    Ok(Self { data })
  }

  /// Build from row vectors; rows of unequal length are rejected.
  pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
    let p = rows.first().map(|r| r.len()).unwrap_or(0);
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != p) {
      return Err(PortfolioError::MalformedTable(format!(
        "row {i} has {} columns, expected {p}",
        row.len()
      )));
    }

    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    let data = Array2::from_shape_vec((rows.len(), p), flat)
      .map_err(|e| PortfolioError::MalformedTable(e.to_string()))?;
    Self::new(data)
  }

  /// Number of observations.
  pub fn n_obs(&self) -> usize {
    self.data.nrows()
  }

  /// Number of assets.
  pub fn n_assets(&self) -> usize {
    self.data.ncols()
  }

  pub fn view(&self) -> ArrayView2<'_, f64> {
    self.data.view()
  }

  /// Column-wise sample mean.
  pub fn column_means(&self) -> Array1<f64> {
    // n >= 1 is guaranteed by construction
    self.data.sum_axis(Axis(0)) / self.n_obs() as f64
  }

  /// Unnormalized scatter matrix around `means`, formed as `DᵀD` on the centered data.
  pub fn scatter_matrix(&self, means: &Array1<f64>) -> Array2<f64> {
    let centered = &self.data - &means.view().insert_axis(Axis(0));
    let mut scatter = centered.t().dot(&centered);
    symmetrize(&mut scatter);
    scatter
  }
}

/// Replace `m` with `(m + mᵀ) / 2` to remove round-off asymmetry.
pub(crate) fn symmetrize(m: &mut Array2<f64>) {
  let p = m.nrows();
  for i in 0..p {
    for j in (i + 1)..p {
      let avg = 0.5 * (m[[i, j]] + m[[j, i]]);
      m[[i, j]] = avg;
      m[[j, i]] = avg;
    }
  }
}
