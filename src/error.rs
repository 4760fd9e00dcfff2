//! Error types for controllerx.
//!
//! Each stage of an inventory build owns its error enum (configuration,
//! Controller API access, inventory ingestion/filtering). This module folds
//! them into one crate-wide [`Error`] that knows which category a failure
//! belongs to and which exit status the CLI should report for it.

use thiserror::Error;

use crate::config::ConfigError;
use crate::controller::ControllerError;
use crate::inventory::InventoryError;

/// Result type alias for controllerx operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for controllerx.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid or incomplete configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    // ========================================================================
    // Ingestion Errors
    // ========================================================================
    /// Talking to the Controller API failed.
    #[error(transparent)]
    Controller(#[from] ControllerError),

    /// Building or filtering the inventory graph failed.
    #[error(transparent)]
    Inventory(#[from] InventoryError),

    // ========================================================================
    // Other Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error while reading or rendering an inventory document.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error while rendering an inventory document.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Broad failure category, used for diagnostics and exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Missing options, bad values, invalid filter patterns
    Configuration,
    /// Unreachable API, authentication failure, malformed snapshot
    Ingestion,
    /// Filtered graph references an entity it does not contain
    Consistency,
    /// Anything else (local IO, rendering, unknown --host/--graph target)
    Other,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Configuration => write!(f, "configuration"),
            ErrorCategory::Ingestion => write!(f, "ingestion"),
            ErrorCategory::Consistency => write!(f, "consistency"),
            ErrorCategory::Other => write!(f, "other"),
        }
    }
}

impl Error {
    /// Returns the category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) => ErrorCategory::Configuration,
            // A malformed `host` option is caught when the client is built
            Error::Controller(ControllerError::InvalidUrl { .. }) => ErrorCategory::Configuration,
            Error::Controller(_) => ErrorCategory::Ingestion,
            Error::Inventory(e) if e.is_consistency_violation() => ErrorCategory::Consistency,
            Error::Inventory(InventoryError::HostNotFound(_) | InventoryError::GroupNotFound(_)) => {
                ErrorCategory::Other
            }
            Error::Inventory(_) => ErrorCategory::Ingestion,
            Error::Io(_) | Error::Json(_) | Error::Yaml(_) => ErrorCategory::Other,
        }
    }

    /// Returns the error code for CLI exit status.
    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Configuration => 2,
            ErrorCategory::Ingestion => 3,
            ErrorCategory::Consistency => 4,
            ErrorCategory::Other => 1,
        }
    }

    /// Returns a hint for resolving the error, when one is known.
    pub fn hint(&self) -> Option<String> {
        match self {
            Error::Config(e) => e.hint(),
            Error::Controller(e) => Some(e.hint()),
            _ => None,
        }
    }
}
