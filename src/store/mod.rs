//! Flat-file persistence under one root directory.
//!
//! ```text
//! <root>/datasets/dataset_<stamp>.csv
//! <root>/trained_models/<name>_<stamp>.bin
//! <root>/training_logs/<job_id>.json
//! ```
//!
//! Files are never overwritten: new files are claimed with create-new
//! semantics and a numeric suffix breaks same-second collisions.
mod frame;
mod listing;
mod store;

pub use frame::*;
pub use listing::*;
pub use store::*;
