//! Error types for remote client operations.

use std::fmt;

use thiserror::Error;

/// Classification of a remote failure.
///
/// The reconciler only looks at the kind; codes and messages are carried
/// through to the caller untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientErrorKind {
    /// Credentials were rejected or lack permission.
    NotAuthorized,
    /// The registry does not exist.
    NotFound,
    /// The API is rate limiting the caller.
    Throttled,
    /// The request never completed (connect, timeout, broken transport).
    Network,
    /// The API rejected the request as invalid.
    InvalidRequest,
    /// The API answered with a body that could not be decoded.
    Malformed,
    /// The caller aborted the call.
    Cancelled,
    /// The client was configured incorrectly.
    Configuration,
    /// Anything else the API reported.
    Other,
}

impl ClientErrorKind {
    /// Returns a string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotAuthorized => "not authorized",
            Self::NotFound => "not found",
            Self::Throttled => "throttled",
            Self::Network => "network error",
            Self::InvalidRequest => "invalid request",
            Self::Malformed => "malformed response",
            Self::Cancelled => "cancelled",
            Self::Configuration => "invalid client configuration",
            Self::Other => "remote error",
        }
    }
}

impl fmt::Display for ClientErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error returned by a [`RemoteClient`](crate::RemoteClient).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct ClientError {
    /// Classification.
    pub kind: ClientErrorKind,
    /// API error code (e.g. `ThrottlingException`), when one was reported.
    pub code: Option<String>,
    /// Error message.
    pub message: String,
}

impl ClientError {
    /// Creates an error of the given kind.
    pub fn new(kind: ClientErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: None,
            message: message.into(),
        }
    }

    /// Attaches the API error code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Credentials rejected.
    pub fn not_authorized(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::NotAuthorized, message)
    }

    /// Registry missing.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::NotFound, message)
    }

    /// Rate limited.
    pub fn throttled(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Throttled, message)
    }

    /// Transport failure.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Network, message)
    }

    /// Undecodable response.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Malformed, message)
    }

    /// Call aborted by the caller.
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Cancelled, message)
    }

    /// Returns true if the failure is likely transient and the caller may retry.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self.kind,
            ClientErrorKind::Throttled | ClientErrorKind::Network
        )
    }

    /// Classifies an API error response.
    ///
    /// `error_type` is the `__type` field of the error body, which may carry a
    /// namespace prefix (`com.amazonaws.ecr#ThrottlingException`).
    #[must_use]
    pub fn from_api_error(
        status: u16,
        error_type: Option<&str>,
        message: impl Into<String>,
    ) -> Self {
        let code = error_type.map(|t| t.rsplit('#').next().unwrap_or(t).to_string());

        let kind = match code.as_deref() {
            Some(
                "AccessDeniedException"
                | "UnrecognizedClientException"
                | "InvalidSignatureException"
                | "ExpiredTokenException"
                | "MissingAuthenticationTokenException",
            ) => ClientErrorKind::NotAuthorized,
            Some("ThrottlingException" | "TooManyRequestsException" | "LimitExceededException") => {
                ClientErrorKind::Throttled
            }
            Some("ValidationException" | "InvalidParameterException") => {
                ClientErrorKind::InvalidRequest
            }
            Some("RegistryNotFoundException") => ClientErrorKind::NotFound,
            Some("ServerException" | "ServiceUnavailableException") => ClientErrorKind::Network,
            _ => match status {
                401 | 403 => ClientErrorKind::NotAuthorized,
                404 => ClientErrorKind::NotFound,
                429 => ClientErrorKind::Throttled,
                400 => ClientErrorKind::InvalidRequest,
                500..=599 => ClientErrorKind::Network,
                _ => ClientErrorKind::Other,
            },
        };

        Self {
            kind,
            code,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::malformed(err.to_string())
        } else if err.is_builder() {
            Self::new(ClientErrorKind::Configuration, err.to_string())
        } else if let Some(status) = err.status() {
            Self::from_api_error(status.as_u16(), None, err.to_string())
        } else {
            // connect, timeout, request and body errors
            Self::network(err.to_string())
        }
    }
}
