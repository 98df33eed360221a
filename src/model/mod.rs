//! Regression pipeline pieces.
//!
//! Fitting is delegated to linfa's multi-task elastic net; this module wraps
//! the fitted coefficients, the optional target transform, and the metadata
//! that travel together as one persisted [`Bundle`].
mod bundle;
mod device;
mod estimator;
mod metrics;
mod split;
mod transform;

pub use bundle::*;
pub use device::*;
pub use estimator::*;
pub use metrics::*;
pub use split::*;
pub use transform::*;
