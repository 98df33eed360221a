//! Fixed-size pools of OS threads for blocking fit and predict calls.
//!
//! HTTP workers never run the regression backend themselves. They box the
//! call, push it onto a [`Pool`], and either await the returned [`Handle`]
//! (inference) or drop it (training, where progress flows through the job
//! registry instead).
mod handle;
mod pool;

pub use handle::*;
pub use pool::*;
