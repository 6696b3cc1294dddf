//! Transport error types.

use thiserror::Error;

/// A result type using `ApiError`.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Error code the platform uses when a referenced object does not exist.
pub const RESOURCE_DOES_NOT_EXIST: &str = "RESOURCE_DOES_NOT_EXIST";

/// Errors that can occur while talking to the platform's REST API.
///
/// Every variant is a transport failure from the caller's point of view; the
/// variants only differ in what they report.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The platform rejected the credentials (HTTP 401).
    #[error("HTTP 401 Unauthorized: not authenticated")]
    Unauthenticated,

    /// The credentials are valid but lack permission (HTTP 403).
    #[error("HTTP 403 Forbidden: not authorized")]
    Unauthorized,

    /// Any other non-success status.
    #[error("HTTP {status}: {message}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The platform's error code, if the body carried one.
        error_code: Option<String>,
        /// The platform's message, or a generic description.
        message: String,
    },

    /// The request could not be sent or no response was received.
    #[error("request failed: {0}")]
    Request(String),

    /// The response body could not be decoded.
    #[error("invalid response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Returns the HTTP status code carried by this error, if any.
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::Unauthenticated => Some(401),
            Self::Unauthorized => Some(403),
            Self::Status { status, .. } => Some(*status),
            Self::Request(_) | Self::Decode(_) => None,
        }
    }

    /// Returns `true` if the platform reported the referenced object as missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Status {
                status, error_code, ..
            } => *status == 404 || error_code.as_deref() == Some(RESOURCE_DOES_NOT_EXIST),
            _ => false,
        }
    }

    /// Returns `true` for authentication and authorization failures.
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Unauthenticated | Self::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(ApiError::Unauthenticated.status_code(), Some(401));
        assert_eq!(ApiError::Unauthorized.status_code(), Some(403));
        assert_eq!(
            ApiError::Status {
                status: 500,
                error_code: None,
                message: "boom".into()
            }
            .status_code(),
            Some(500)
        );
        assert_eq!(ApiError::Request("timeout".into()).status_code(), None);
    }

    #[test]
    fn not_found_detection() {
        let by_code = ApiError::Status {
            status: 400,
            error_code: Some(RESOURCE_DOES_NOT_EXIST.to_string()),
            message: "Path (/x) doesn't exist.".into(),
        };
        let by_status = ApiError::Status {
            status: 404,
            error_code: None,
            message: "not found".into(),
        };
        assert!(by_code.is_not_found());
        assert!(by_status.is_not_found());
        assert!(!ApiError::Unauthorized.is_not_found());
    }

    #[test]
    fn messages_distinguish_auth_failures() {
        assert!(ApiError::Unauthenticated.to_string().contains("401"));
        assert!(ApiError::Unauthorized.to_string().contains("403"));
        assert!(ApiError::Unauthorized.is_auth_failure());
    }
}
