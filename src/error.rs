//! Application error types.
//!
//! These errors are serializable so UI shells can render them as
//! view-local error state instead of letting them escape as failures.

use serde::Serialize;
use thiserror::Error;

/// Application-level errors returned by the API client, services and commands.
///
/// All variants serialize to a structured JSON object for frontend consumption.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum AppError {
    /// Input rejected before any network call was made.
    #[error("Validation failed: {}", errors.join("; "))]
    Validation { errors: Vec<String> },

    /// The session is missing, expired, or lacks the required role (401/403).
    #[error("Unauthorized ({status_code}): {message}")]
    Unauthorized { status_code: u16, message: String },

    /// Requested resource not found (404).
    #[error("Not found: {resource}")]
    NotFound {
        resource: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },

    /// The scholarship API answered with any other non-2xx status.
    #[error("API error: {message}")]
    Api {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        status_code: Option<u16>,
        #[serde(skip_serializing_if = "Option::is_none")]
        endpoint: Option<String>,
    },

    /// Network request failed.
    #[error("Network error: {message}")]
    Network { message: String },

    /// A response or document could not be decoded.
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// Client configuration is missing or invalid.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Local file operation failed.
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Internal application error.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    /// Create a validation error from a list of problems.
    pub fn validation(errors: Vec<String>) -> Self {
        Self::Validation { errors }
    }

    /// Create an unauthorized error for a 401/403 response.
    pub fn unauthorized(status_code: u16, message: impl Into<String>) -> Self {
        Self::Unauthorized {
            status_code,
            message: message.into(),
        }
    }

    /// Create a not found error.
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: None,
        }
    }

    /// Create a not found error with ID.
    pub fn not_found_with_id(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: Some(id.into()),
        }
    }

    /// Create an API error without status context.
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
            status_code: None,
            endpoint: None,
        }
    }

    /// Create an API error with status code and endpoint.
    pub fn api_full(
        message: impl Into<String>,
        status_code: u16,
        endpoint: impl Into<String>,
    ) -> Self {
        Self::Api {
            message: message.into(),
            status_code: Some(status_code),
            endpoint: Some(endpoint.into()),
        }
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this error should send the user back to the login page.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Whether this error is a 404, which callers usually treat as an empty state.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// HTTP status carried by the error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { status_code, .. } => Some(*status_code),
            Self::NotFound { .. } => Some(404),
            Self::Api { status_code, .. } => *status_code,
            _ => None,
        }
    }
}

// Conversions from common error types

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network("Request timed out")
        } else if err.is_connect() {
            Self::network("Failed to connect to server")
        } else if err.is_decode() {
            Self::parse(format!("Failed to decode response: {}", err))
        } else if let Some(status) = err.status() {
            Self::api(format!("HTTP error {}: {}", status.as_u16(), err))
        } else {
            Self::network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse(format!("JSON error: {}", err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let err = AppError::network("connection reset");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"type\":\"Network\""));
        assert!(json.contains("connection reset"));
    }

    #[test]
    fn test_api_error_full() {
        let err = AppError::api_full("Bad Request", 400, "/patron/ranking");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"status_code\":400"));
        assert!(json.contains("/patron/ranking"));
        assert_eq!(err.status_code(), Some(400));
    }

    #[test]
    fn test_not_found_with_id() {
        let err = AppError::not_found_with_id("Application", "123");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"resource\":\"Application\""));
        assert!(json.contains("\"id\":\"123\""));
        assert!(err.is_not_found());
        assert_eq!(err.status_code(), Some(404));
    }

    #[test]
    fn test_optional_fields_not_serialized() {
        let err = AppError::api("boom");
        let json = serde_json::to_string(&err).unwrap();
        assert!(!json.contains("endpoint"));
        assert!(!json.contains("status_code"));
    }

    #[test]
    fn test_unauthorized_classification() {
        let err = AppError::unauthorized(403, "Forbidden");
        assert!(err.is_unauthorized());
        assert!(!err.is_not_found());
        assert_eq!(err.status_code(), Some(403));
    }

    #[test]
    fn test_validation_display_joins_errors() {
        let err = AppError::validation(vec![
            "CV file is required".to_string(),
            "Full name is required".to_string(),
        ]);
        assert_eq!(
            format!("{}", err),
            "Validation failed: CV file is required; Full name is required"
        );
    }
}
