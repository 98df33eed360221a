//! Wire types for both HTTP services.
mod request;
mod response;
#[cfg(feature = "server")]
mod upload;

pub use request::*;
pub use response::*;
#[cfg(feature = "server")]
pub use upload::*;
