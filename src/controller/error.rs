//! Error types for Controller API access.

use thiserror::Error;

/// Result type alias for Controller API operations.
pub type ControllerResult<T> = Result<T, ControllerError>;

/// Failures while talking to the Controller REST API.
#[derive(Error, Debug)]
pub enum ControllerError {
    // ========================================================================
    // Network Errors
    // ========================================================================
    /// The configured host does not form a valid URL.
    #[error("invalid Controller URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// HTTP request failed.
    #[error("HTTP request failed: {message}")]
    HttpError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Connection to the Controller failed.
    #[error("failed to connect to Controller at '{server}': {message}")]
    ConnectionFailed { server: String, message: String },

    /// Request timed out.
    #[error("request to '{url}' timed out after {timeout_secs} seconds")]
    Timeout { url: String, timeout_secs: u64 },

    /// Credentials were rejected.
    #[error("authentication failed ({status}): {message}")]
    AuthenticationFailed { status: u16, message: String },

    /// Any other non-success status.
    #[error("request to '{url}' failed with status {status}: {message}")]
    UnexpectedStatus {
        url: String,
        status: u16,
        message: String,
    },

    // ========================================================================
    // Response Errors
    // ========================================================================
    /// The response body is not valid JSON.
    #[error("invalid JSON in response from '{url}': {source}")]
    InvalidJson {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// The response is JSON but not shaped as expected.
    #[error("unexpected response from '{url}': {message}")]
    UnexpectedResponse { url: String, message: String },

    /// No inventory matches the configured name.
    #[error("inventory '{name}' not found on the Controller")]
    InventoryNotFound { name: String },
}

impl ControllerError {
    /// Create an HTTP error.
    pub fn http_error(message: impl Into<String>) -> Self {
        Self::HttpError {
            message: message.into(),
            source: None,
        }
    }

    /// Create a connection failed error.
    pub fn connection_failed(server: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            server: server.into(),
            message: message.into(),
        }
    }

    /// Create an unexpected response error.
    pub fn unexpected_response(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnexpectedResponse {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Convert a transport error, keeping the configured timeout for the message.
    pub fn from_transport(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            ControllerError::Timeout {
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
                timeout_secs,
            }
        } else {
            ControllerError::from(err)
        }
    }

    /// Check if the error means the credentials were rejected.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, ControllerError::AuthenticationFailed { .. })
    }

    /// Check if the error is a network-level failure.
    pub fn is_network_error(&self) -> bool {
        matches!(
            self,
            ControllerError::HttpError { .. }
                | ControllerError::ConnectionFailed { .. }
                | ControllerError::Timeout { .. }
        )
    }

    /// Get a hint for resolving the error.
    pub fn hint(&self) -> String {
        match self {
            ControllerError::InvalidUrl { .. } => {
                "Set 'host' to the Controller address, for example https://controller.example.com".to_string()
            }
            ControllerError::ConnectionFailed { server, .. } => {
                format!(
                    "Check your network connection and verify the Controller URL: {}",
                    server
                )
            }
            ControllerError::Timeout { .. } => {
                "The Controller did not answer in time. Check that it is reachable and not overloaded.".to_string()
            }
            ControllerError::AuthenticationFailed { .. } => {
                "Check 'username' and 'password' (CONTROLLER_USERNAME / CONTROLLER_PASSWORD).".to_string()
            }
            ControllerError::InventoryNotFound { name } => {
                format!(
                    "Verify that an inventory named '{}' exists and is visible to this user, or pass its numeric ID.",
                    name
                )
            }
            ControllerError::HttpError { message, .. } if message.contains("certificate") => {
                "Set validate_certs: false to accept self-signed certificates.".to_string()
            }
            _ => "Check the error message for details.".to_string(),
        }
    }
}

impl From<reqwest::Error> for ControllerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ControllerError::Timeout {
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
                timeout_secs: 30,
            }
        } else if err.is_connect() {
            ControllerError::ConnectionFailed {
                server: err
                    .url()
                    .map(|u| u.host_str().unwrap_or("unknown").to_string())
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.to_string(),
            }
        } else {
            ControllerError::HttpError {
                message: err.to_string(),
                source: Some(Box::new(err)),
            }
        }
    }
}
