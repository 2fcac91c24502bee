//! # Quadratic Programs
//!
//! $$
//! \min_{\mathbf{w}} \tfrac12\mathbf{w}^\top H\mathbf{w} - \mathbf{f}^\top\mathbf{w}
//! \quad\text{s.t.}\quad A_{eq}\mathbf{w}=\mathbf{b}_{eq},\ A_{in}\mathbf{w}\ge\mathbf{b}_{in}
//! $$
//!
//! Convex QP problem description and the solver backends able to handle it.

use clarabel::algebra::CscMatrix;
use clarabel::solver::DefaultSettingsBuilder;
use clarabel::solver::DefaultSolver;
use clarabel::solver::IPSolver;
use clarabel::solver::SolverStatus;
use clarabel::solver::SupportedConeT;
use impl_new_derive::ImplNew;
use ndarray::Array1;
use ndarray::Array2;
use thiserror::Error;
use tracing::debug;

/// Single linear constraint row `coefficients · w (=|>=) rhs`.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearConstraint {
  pub coefficients: Array1<f64>,
  pub rhs: f64,
}

impl LinearConstraint {
  pub fn new(coefficients: Array1<f64>, rhs: f64) -> Self {
    Self { coefficients, rhs }
  }
}

/// Convex QP in the form solved by every [`QpSolver`].
#[derive(Clone, Debug)]
pub struct QpProblem {
  /// Positive-semidefinite quadratic form.
  pub h: Array2<f64>,
  /// Linear term (enters the objective with a minus sign).
  pub f: Array1<f64>,
  /// Rows with `a · w = b`.
  pub equalities: Vec<LinearConstraint>,
  /// Rows with `a · w >= b`.
  pub inequalities: Vec<LinearConstraint>,
}

impl QpProblem {
  pub fn dim(&self) -> usize {
    self.f.len()
  }

  /// Objective value at `w`.
  pub fn objective(&self, w: &Array1<f64>) -> f64 {
    0.5 * w.dot(&self.h.dot(w)) - self.f.dot(w)
  }
}

/// Reasons a backend may fail to return a minimizer.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum QpFailure {
  #[error("no feasible point")]
  Infeasible,
  #[error("objective is unbounded below")]
  Unbounded,
  #[error("unsupported problem: {0}")]
  Unsupported(String),
  #[error("did not converge within {iterations} iterations")]
  NotConverged { iterations: usize },
  #[error("numerical failure: {0}")]
  Numerical(String),
}

/// Narrow delegate interface to a convex QP backend.
pub trait QpSolver {
  fn solve(&self, problem: &QpProblem) -> Result<Array1<f64>, QpFailure>;
}

/// Accelerated projected gradient for problems whose feasible set is the
/// simplex `{w >= 0, c·Σw = b}`.
#[derive(ImplNew, Clone, Copy, Debug)]
pub struct ProjectedGradientSolver {
  pub max_iters: usize,
  /// Stop once successive iterates differ by less than this in max-norm.
  pub tolerance: f64,
}

impl Default for ProjectedGradientSolver {
  fn default() -> Self {
    Self::new(200_000, 1e-13)
  }
}

impl ProjectedGradientSolver {
  /// Budget `Σw` of the simplex described by the constraint rows.
  fn simplex_budget(problem: &QpProblem) -> Result<f64, QpFailure> {
    let p = problem.dim();
    let [eq] = problem.equalities.as_slice() else {
      return Err(QpFailure::Unsupported(format!(
        "expected one budget row, got {}",
        problem.equalities.len()
      )));
    };

    let c = eq.coefficients.first().copied().unwrap_or(0.0);
    if eq.coefficients.len() != p || c <= 0.0 || eq.coefficients.iter().any(|&a| a != c) {
      return Err(QpFailure::Unsupported(
        "budget row must have identical positive coefficients".into(),
      ));
    }

    let mut bounded = vec![false; p];
    for row in &problem.inequalities {
      let support: Vec<usize> = row
        .coefficients
        .iter()
        .enumerate()
        .filter(|(_, &a)| a != 0.0)
        .map(|(i, _)| i)
        .collect();
      match support.as_slice() {
        [i] if row.coefficients.len() == p && row.coefficients[*i] > 0.0 && row.rhs == 0.0 => {
          bounded[*i] = true;
        }
        _ => {
          return Err(QpFailure::Unsupported(
            "inequalities must be non-negativity bounds".into(),
          ))
        }
      }
    }
    if bounded.iter().any(|b| !b) {
      return Err(QpFailure::Unsupported(
        "every weight needs a non-negativity bound".into(),
      ));
    }

    Ok(eq.rhs / c)
  }
}

impl QpSolver for ProjectedGradientSolver {
  fn solve(&self, problem: &QpProblem) -> Result<Array1<f64>, QpFailure> {
    let p = problem.dim();
    if problem.h.dim() != (p, p) {
      return Err(QpFailure::Unsupported(format!(
        "H is {:?} but f has length {p}",
        problem.h.dim()
      )));
    }

    let budget = Self::simplex_budget(problem)?;
    if budget < 0.0 {
      return Err(QpFailure::Infeasible);
    }
    if budget == 0.0 {
      return Ok(Array1::zeros(p));
    }

    // Gershgorin bound on the largest eigenvalue of H
    let lipschitz = problem
      .h
      .rows()
      .into_iter()
      .map(|row| row.iter().map(|v| v.abs()).sum::<f64>())
      .fold(0.0, f64::max)
      .max(1e-12);
    let step = 1.0 / lipschitz;

    let mut x = Array1::from_elem(p, budget / p as f64);
    let mut y = x.clone();
    let mut t = 1.0_f64;

    for iter in 0..self.max_iters {
      let grad = problem.h.dot(&y) - &problem.f;
      let x_next = project_simplex(&(&y - &(grad * step)), budget);

      let delta = (&x_next - &x).iter().fold(0.0_f64, |m, d| m.max(d.abs()));
      if !delta.is_finite() {
        return Err(QpFailure::Numerical("iterate became non-finite".into()));
      }

      let t_next = 0.5 * (1.0 + (1.0 + 4.0 * t * t).sqrt());
      y = &x_next + &((&x_next - &x) * ((t - 1.0) / t_next));
      x = x_next;
      t = t_next;

      if delta < self.tolerance {
        debug!(iterations = iter + 1, "projected gradient converged");
        return Ok(x);
      }
    }

    Err(QpFailure::NotConverged {
      iterations: self.max_iters,
    })
  }
}

/// Euclidean projection of `v` onto `{w >= 0, Σw = budget}`.
pub fn project_simplex(v: &Array1<f64>, budget: f64) -> Array1<f64> {
  let mut u = v.to_vec();
  u.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

  let mut cssv = 0.0;
  let mut theta = 0.0;
  for (i, ui) in u.iter().enumerate() {
    cssv += ui;
    let candidate = (cssv - budget) / (i as f64 + 1.0);
    if ui - candidate > 0.0 {
      theta = candidate;
    }
  }

  v.mapv(|x| (x - theta).max(0.0))
}

/// General convex QP backend on top of the Clarabel interior-point solver.
#[derive(Clone, Copy, Debug)]
pub struct ClarabelSolver {
  pub max_iter: u32,
}

impl Default for ClarabelSolver {
  fn default() -> Self {
    Self { max_iter: 200 }
  }
}

impl QpSolver for ClarabelSolver {
  fn solve(&self, problem: &QpProblem) -> Result<Array1<f64>, QpFailure> {
    let p = problem.dim();
    if problem.h.dim() != (p, p) {
      return Err(QpFailure::Unsupported(format!(
        "H is {:?} but f has length {p}",
        problem.h.dim()
      )));
    }

    // Clarabel reads the upper triangle of P only.
    let mut p_colptr = vec![0];
    let mut p_rowval = Vec::new();
    let mut p_nzval = Vec::new();
    for j in 0..p {
      for i in 0..=j {
        let v = problem.h[[i, j]];
        if v != 0.0 {
          p_rowval.push(i);
          p_nzval.push(v);
        }
      }
      p_colptr.push(p_nzval.len());
    }
    let p_mat = CscMatrix::new(p, p, p_colptr, p_rowval, p_nzval);
    let q: Vec<f64> = problem.f.iter().map(|v| -v).collect();

    // Ax + s = b with s in {0} for equalities and s >= 0 for inequalities,
    // so a·w >= b becomes -a·w + s = -b.
    let n_eq = problem.equalities.len();
    let n_in = problem.inequalities.len();
    let rows: Vec<(&Array1<f64>, f64)> = problem
      .equalities
      .iter()
      .map(|c| (&c.coefficients, 1.0))
      .chain(problem.inequalities.iter().map(|c| (&c.coefficients, -1.0)))
      .collect();
    if let Some((a, _)) = rows.iter().find(|(a, _)| a.len() != p) {
      return Err(QpFailure::Unsupported(format!(
        "constraint row has {} coefficients, expected {p}",
        a.len()
      )));
    }

    let mut a_colptr = vec![0];
    let mut a_rowval = Vec::new();
    let mut a_nzval = Vec::new();
    for j in 0..p {
      for (r, (a, sign)) in rows.iter().enumerate() {
        if a[j] != 0.0 {
          a_rowval.push(r);
          a_nzval.push(sign * a[j]);
        }
      }
      a_colptr.push(a_nzval.len());
    }
    let a_mat = CscMatrix::new(n_eq + n_in, p, a_colptr, a_rowval, a_nzval);
    let b: Vec<f64> = problem
      .equalities
      .iter()
      .map(|c| c.rhs)
      .chain(problem.inequalities.iter().map(|c| -c.rhs))
      .collect();

    let mut cones = Vec::new();
    if n_eq > 0 {
      cones.push(SupportedConeT::ZeroConeT(n_eq));
    }
    if n_in > 0 {
      cones.push(SupportedConeT::NonnegativeConeT(n_in));
    }

    let settings = DefaultSettingsBuilder::default()
      .max_iter(self.max_iter)
      .verbose(false)
      .build()
      .map_err(|e| QpFailure::Numerical(format!("invalid settings: {e}")))?;

    let mut solver = DefaultSolver::new(&p_mat, &q, &a_mat, &b, &cones, settings)
      .map_err(|e| QpFailure::Numerical(format!("{e:?}")))?;
    solver.solve();

    let solution = &solver.solution;
    debug!(status = ?solution.status, iterations = solution.iterations, "clarabel finished");
    match &solution.status {
      SolverStatus::Solved | SolverStatus::AlmostSolved => Ok(Array1::from_vec(solution.x.clone())),
      SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
        Err(QpFailure::Infeasible)
      }
      SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
        Err(QpFailure::Unbounded)
      }
      SolverStatus::MaxIterations => Err(QpFailure::NotConverged {
        iterations: self.max_iter as usize,
      }),
      other => Err(QpFailure::Numerical(format!("{other:?}"))),
    }
  }
}
