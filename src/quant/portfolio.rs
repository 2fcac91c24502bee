//! # Portfolio
//!
//! $$
//! \sigma_p^2 = \mathbf{w}^\top \Sigma \mathbf{w}
//! $$
//!
//! Long-only mean-variance allocation on a Bayesian return estimate.

pub mod data;
pub mod engine;
pub mod evaluation;
pub mod optimizers;
pub mod qp;
pub mod types;

pub use data::ReturnMatrix;
pub use engine::PortfolioEngine;
pub use engine::PortfolioEngineConfig;
pub use evaluation::evaluate;
pub use evaluation::portfolio_returns;
pub use optimizers::mean_variance_problem;
pub use optimizers::normalize_weights;
pub use optimizers::optimize_mean_variance;
pub use qp::ClarabelSolver;
pub use qp::LinearConstraint;
pub use qp::ProjectedGradientSolver;
pub use qp::QpFailure;
pub use qp::QpProblem;
pub use qp::QpSolver;
pub use types::AllocationReport;
pub use types::EvaluationMetrics;
pub use types::SolverBackend;
