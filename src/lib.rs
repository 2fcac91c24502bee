//! # Bayesian Portfolio
//!
//! $$
//! R \to (\mu_n,\Sigma_n) \to \mathbf{w}^\* \to (\bar r_p,\sigma_p,SR)
//! $$
//!
//! Portfolio allocation from historical returns: a Normal-Inverse-Wishart
//! posterior estimate of the return distribution feeds a long-only,
//! fully-invested mean-variance quadratic program.
//!
//! ```ignore
//! use bayesian_portfolio::quant::portfolio::{PortfolioEngine, PortfolioEngineConfig, ReturnMatrix};
//!
//! let returns = ReturnMatrix::from_rows(&rows)?;
//! let report = PortfolioEngine::new(PortfolioEngineConfig::default()).run(&returns)?;
//! ```

pub mod error;
pub mod io;
pub mod quant;
pub mod stats;

pub use error::PortfolioError;
pub use error::Result;
