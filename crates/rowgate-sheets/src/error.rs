//! Error types for remote spreadsheet operations.

/// Errors that can occur while talking to a spreadsheet backend.
#[derive(Debug, thiserror::Error)]
pub enum SheetsError {
    /// The service account key could not be loaded or parsed.
    #[error("Invalid service account credentials: {message}")]
    Credentials {
        /// Description of what is wrong with the credentials.
        message: String,
    },

    /// The OAuth token exchange failed.
    #[error("Authentication failed: {message}")]
    Auth {
        /// Description of the authentication failure.
        message: String,
    },

    /// Transport-level failure (connect, timeout, TLS).
    #[error("Request to spreadsheet service failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote API answered with a non-success status.
    #[error("Spreadsheet service returned {status}: {message}")]
    Api {
        /// HTTP status code returned by the service.
        status: u16,
        /// Error message reported by the service.
        message: String,
    },

    /// The range expression cannot address any cells.
    #[error("Invalid range: {message}")]
    InvalidRange {
        /// Description of why the range is invalid.
        message: String,
    },

    /// The request payload cannot be turned into rows.
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Description of why the input is invalid.
        message: String,
    },

    /// The backend could not be initialized at startup.
    #[error("Spreadsheet backend unavailable: {reason}")]
    Unavailable {
        /// The startup failure that left the backend unusable.
        reason: String,
    },

    /// The remote API answered with a body we could not interpret.
    #[error("Unexpected response from spreadsheet service: {message}")]
    Decode {
        /// Description of the decoding failure.
        message: String,
    },
}

impl SheetsError {
    /// Creates a new `Credentials` error.
    #[must_use]
    pub fn credentials(message: impl Into<String>) -> Self {
        Self::Credentials {
            message: message.into(),
        }
    }

    /// Creates a new `Auth` error.
    #[must_use]
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Creates a new `Api` error.
    #[must_use]
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Creates a new `InvalidRange` error.
    #[must_use]
    pub fn invalid_range(message: impl Into<String>) -> Self {
        Self::InvalidRange {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidInput` error.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a new `Unavailable` error.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Creates a new `Decode` error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Returns `true` if the failure happened before any remote call was attempted.
    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::Credentials { .. }
                | Self::InvalidRange { .. }
                | Self::InvalidInput { .. }
                | Self::Unavailable { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display_includes_status() {
        let err = SheetsError::api(400, "Unable to parse range: Nope!A1:Z");
        assert_eq!(
            err.to_string(),
            "Spreadsheet service returned 400: Unable to parse range: Nope!A1:Z"
        );
        assert!(!err.is_local());
    }

    #[test]
    fn local_errors_are_classified() {
        assert!(SheetsError::invalid_input("index must be an integer").is_local());
        assert!(SheetsError::unavailable("missing key").is_local());
        assert!(!SheetsError::auth("invalid_grant").is_local());
    }
}
