//! The resident predictor and its HTTP service.
//!
//! One bundle is loaded at startup and never reloaded. Requests assemble
//! feature tables on the HTTP worker and run the actual prediction on the
//! inference pool.
mod predictor;

#[cfg(feature = "server")]
mod handlers;
#[cfg(feature = "server")]
mod server;

pub use predictor::*;

#[cfg(feature = "server")]
pub use server::*;
