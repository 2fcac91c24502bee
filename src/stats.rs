//! # Stats
//!
//! $$
//! (\mu,\Sigma) \sim \mathrm{NIW}(\mu_0,\kappa_0,\Psi_0,\nu_0)
//! $$
//!
pub mod niw;

pub use niw::NiwPosterior;
pub use niw::NiwPrior;
