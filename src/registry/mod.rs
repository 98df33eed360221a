//! In-memory training job lifecycle.
//!
//! Jobs move `pending → running → {completed | failed}` and never leave a
//! terminal state. The [`Registry`] is shared between HTTP handlers and the
//! training workers; nothing here touches disk.
mod job;
mod registry;
mod status;

pub use job::*;
pub use registry::*;
pub use status::*;
