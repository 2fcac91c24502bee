//! # Quant
//!
//! $$
//! \mathbf{w}^\* = \arg\max_{\mathbf{w}} \ \mu^\top\mathbf{w} - \lambda\,\mathbf{w}^\top\Sigma\mathbf{w}
//! $$
//!
pub mod portfolio;
