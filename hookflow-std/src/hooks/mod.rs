//! Handler wrappers.

pub mod logging;
#[cfg(feature = "timeout")]
pub mod timeout;

pub use logging::Logged;
#[cfg(feature = "timeout")]
pub use timeout::{Timeout, TimeoutError};
