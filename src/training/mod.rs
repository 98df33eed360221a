//! The staged training orchestrator and the HTTP service around it.
//!
//! [`Trainer`] validates a request, registers a pending job and hands a
//! [`Session`] to the training pool; the session then owns the job record
//! until it reaches a terminal state.
mod config;
mod record;
mod session;
mod stage;
mod trainer;

#[cfg(feature = "server")]
mod handlers;
#[cfg(feature = "server")]
mod server;

pub use config::*;
pub use record::*;
pub use session::*;
pub use stage::*;
pub use trainer::*;

#[cfg(feature = "server")]
pub use server::*;
