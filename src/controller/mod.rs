//! Controller REST API access.
//!
//! [`ControllerClient`] fetches the raw pieces of an inventory build. It
//! knows nothing about filtering or graph rules.

pub mod client;
pub mod error;

pub use client::{
    normalize_host, ControllerClient, ControllerClientBuilder, ControllerClientConfig,
    DEFAULT_TIMEOUT_SECS,
};
pub use error::{ControllerError, ControllerResult};
