//! Error taxonomy for the Threads client
//!
//! Every failure the library surfaces is one of a closed set of kinds. The
//! five remote-facing kinds share the same shape (`code`, `message`,
//! `error_type`, `details`) plus one kind-specific field, so callers can
//! branch with the `is_*` predicates and pull payloads out with the `as_*`
//! accessors without matching on message text.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Type tag carried by [`AuthenticationError`]
pub const AUTHENTICATION_ERROR: &str = "authentication_error";
/// Type tag carried by [`RateLimitError`]
pub const RATE_LIMIT_ERROR: &str = "rate_limit_error";
/// Type tag carried by [`ValidationError`]
pub const VALIDATION_ERROR: &str = "validation_error";
/// Type tag carried by [`NetworkError`]
pub const NETWORK_ERROR: &str = "network_error";
/// Type tag carried by [`ApiError`]
pub const API_ERROR: &str = "api_error";

/// Renders the optional details suffix shared by every kind
struct Details<'a>(&'a str);

impl fmt::Display for Details<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            Ok(())
        } else {
            write!(f, " (details: {})", self.0)
        }
    }
}

/// Missing, expired, invalid or unauthorized token
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{error_type} [{code}]: {message}{}", Details(.details))]
pub struct AuthenticationError {
    /// Numeric code (HTTP status or platform code)
    pub code: i64,
    /// Human readable message
    pub message: String,
    /// Machine readable type tag
    pub error_type: String,
    /// Free-form details
    pub details: String,
}

impl AuthenticationError {
    /// Create a new authentication error
    pub fn new(code: i64, message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            error_type: AUTHENTICATION_ERROR.to_string(),
            details: details.into(),
        }
    }
}

/// Quota exhausted on the remote side
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{error_type} [{code}]: {message}{} (retry after {}s)", Details(.details), .retry_after.as_secs())]
pub struct RateLimitError {
    /// Numeric code (HTTP status or platform code)
    pub code: i64,
    /// Human readable message
    pub message: String,
    /// Machine readable type tag
    pub error_type: String,
    /// Free-form details
    pub details: String,
    /// How long the caller should wait before resubmitting (zero if unknown)
    pub retry_after: Duration,
}

impl RateLimitError {
    /// Create a new rate limit error
    pub fn new(
        code: i64,
        message: impl Into<String>,
        details: impl Into<String>,
        retry_after: Duration,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            error_type: RATE_LIMIT_ERROR.to_string(),
            details: details.into(),
            retry_after,
        }
    }
}

/// Caller input violates a documented constraint
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{error_type} [{code}]: {message}{} (field: {field})", Details(.details))]
pub struct ValidationError {
    /// Numeric code
    pub code: i64,
    /// Human readable message
    pub message: String,
    /// Machine readable type tag
    pub error_type: String,
    /// Free-form details
    pub details: String,
    /// Name of the offending field
    pub field: String,
}

impl ValidationError {
    /// Create a new validation error
    pub fn new(
        code: i64,
        message: impl Into<String>,
        details: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            error_type: VALIDATION_ERROR.to_string(),
            details: details.into(),
            field: field.into(),
        }
    }
}

/// Transport-level failure or remote 5xx
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{error_type} [{code}]: {message}{}", Details(.details))]
pub struct NetworkError {
    /// Numeric code (HTTP status, or 0 when no response was received)
    pub code: i64,
    /// Human readable message
    pub message: String,
    /// Machine readable type tag
    pub error_type: String,
    /// Free-form details
    pub details: String,
    /// Whether retrying may succeed
    pub temporary: bool,
}

impl NetworkError {
    /// Create a new network error
    pub fn new(
        code: i64,
        message: impl Into<String>,
        details: impl Into<String>,
        temporary: bool,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            error_type: NETWORK_ERROR.to_string(),
            details: details.into(),
            temporary,
        }
    }
}

/// Remote failure not covered by the other kinds
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{error_type} [{code}]: {message}{}", Details(.details))]
pub struct ApiError {
    /// Numeric code (HTTP status or platform code)
    pub code: i64,
    /// Human readable message
    pub message: String,
    /// Machine readable type tag
    pub error_type: String,
    /// Free-form details
    pub details: String,
    /// Request id reported by the platform, if any
    pub request_id: String,
}

impl ApiError {
    /// Create a new API error
    pub fn new(
        code: i64,
        message: impl Into<String>,
        details: impl Into<String>,
        request_id: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            error_type: API_ERROR.to_string(),
            details: details.into(),
            request_id: request_id.into(),
        }
    }
}

/// Every error the library returns
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// See [`AuthenticationError`]
    #[error(transparent)]
    Authentication(#[from] AuthenticationError),

    /// See [`RateLimitError`]
    #[error(transparent)]
    RateLimit(#[from] RateLimitError),

    /// See [`ValidationError`]
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// See [`NetworkError`]
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// See [`ApiError`]
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The caller's cancellation signal fired
    #[error("operation cancelled")]
    Cancelled,

    /// A client-side deadline elapsed (container polling)
    #[error("timed out: {0}")]
    Timeout(String),

    /// A successful response body did not match the expected shape
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// Anything else (bad local state, missing debug payload, ...)
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl Error {
    /// Shorthand for a client-side validation failure
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(ValidationError::new(400, message, "", field))
    }

    /// Shorthand for a missing-token failure
    pub fn not_authenticated(message: impl Into<String>) -> Self {
        Self::Authentication(AuthenticationError::new(401, message, ""))
    }

    /// Short machine-readable name of the kind
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Authentication(_) => AUTHENTICATION_ERROR,
            Self::RateLimit(_) => RATE_LIMIT_ERROR,
            Self::Validation(_) => VALIDATION_ERROR,
            Self::Network(_) => NETWORK_ERROR,
            Self::Api(_) => API_ERROR,
            Self::Cancelled => "cancelled",
            Self::Timeout(_) => "timeout",
            Self::Decode(_) => "decode_error",
            Self::Other(_) => "error",
        }
    }

    /// Numeric code, when the kind carries one
    pub const fn code(&self) -> Option<i64> {
        match self {
            Self::Authentication(e) => Some(e.code),
            Self::RateLimit(e) => Some(e.code),
            Self::Validation(e) => Some(e.code),
            Self::Network(e) => Some(e.code),
            Self::Api(e) => Some(e.code),
            _ => None,
        }
    }

    /// Human message, without the kind prefix
    pub fn message(&self) -> String {
        match self {
            Self::Authentication(e) => e.message.clone(),
            Self::RateLimit(e) => e.message.clone(),
            Self::Validation(e) => e.message.clone(),
            Self::Network(e) => e.message.clone(),
            Self::Api(e) => e.message.clone(),
            other => other.to_string(),
        }
    }

    /// Whether this is an authentication error
    pub const fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }

    /// Whether this is a rate limit error
    pub const fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimit(_))
    }

    /// Whether this is a validation error
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Whether this is a network error
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Whether this is an API error
    pub const fn is_api(&self) -> bool {
        matches!(self, Self::Api(_))
    }

    /// Whether the caller cancelled the operation
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Whether a client-side deadline elapsed
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Extract the authentication payload
    pub const fn as_authentication(&self) -> Option<&AuthenticationError> {
        match self {
            Self::Authentication(e) => Some(e),
            _ => None,
        }
    }

    /// Extract the rate limit payload
    pub const fn as_rate_limit(&self) -> Option<&RateLimitError> {
        match self {
            Self::RateLimit(e) => Some(e),
            _ => None,
        }
    }

    /// Extract the validation payload
    pub const fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(e) => Some(e),
            _ => None,
        }
    }

    /// Extract the network payload
    pub const fn as_network(&self) -> Option<&NetworkError> {
        match self {
            Self::Network(e) => Some(e),
            _ => None,
        }
    }

    /// Extract the API payload
    pub const fn as_api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(e) => Some(e),
            _ => None,
        }
    }

    /// Retry-after duration of a rate limit error
    pub fn retry_after(&self) -> Option<Duration> {
        self.as_rate_limit().map(|e| e.retry_after)
    }

    /// Offending field of a validation error
    pub fn validation_field(&self) -> Option<&str> {
        self.as_validation().map(|e| e.field.as_str())
    }

    /// Whether a network error is worth retrying
    pub fn is_temporary(&self) -> bool {
        self.as_network().is_some_and(|e| e.temporary)
    }

    /// Request id of an API error
    pub fn request_id(&self) -> Option<&str> {
        self.as_api().map(|e| e.request_id.as_str())
    }

    /// Find a library error anywhere in an `anyhow` chain
    pub fn find(err: &anyhow::Error) -> Option<&Self> {
        err.chain().find_map(|cause| cause.downcast_ref::<Self>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_set_type_tags() {
        let auth = AuthenticationError::new(401, "Invalid token", "Token expired");
        assert_eq!(auth.error_type, "authentication_error");
        assert_eq!(auth.code, 401);

        let rate = RateLimitError::new(429, "Slow down", "", Duration::from_secs(60));
        assert_eq!(rate.error_type, "rate_limit_error");
        assert_eq!(rate.retry_after, Duration::from_secs(60));

        let validation = ValidationError::new(400, "Invalid input", "", "text");
        assert_eq!(validation.error_type, "validation_error");
        assert_eq!(validation.field, "text");

        let network = NetworkError::new(0, "Connection failed", "", true);
        assert_eq!(network.error_type, "network_error");
        assert!(network.temporary);

        let api = ApiError::new(500, "Server error", "", "req-123");
        assert_eq!(api.error_type, "api_error");
        assert_eq!(api.request_id, "req-123");
    }

    #[test]
    fn test_display_contains_all_parts() {
        let err = AuthenticationError::new(401, "Invalid token", "Token expired");
        let text = err.to_string();
        assert!(text.contains("401"));
        assert!(text.contains("Invalid token"));
        assert!(text.contains("authentication_error"));
        assert!(text.contains("Token expired"));

        let bare = ApiError::new(404, "Not found", "", "");
        assert!(!bare.to_string().contains("details"));
    }

    #[test]
    fn test_predicates_only_match_own_kind() {
        let errors = [
            Error::from(AuthenticationError::new(401, "a", "")),
            Error::from(RateLimitError::new(429, "r", "", Duration::ZERO)),
            Error::from(ValidationError::new(400, "v", "", "f")),
            Error::from(NetworkError::new(0, "n", "", false)),
            Error::from(ApiError::new(500, "x", "", "")),
        ];

        let checks: [fn(&Error) -> bool; 5] = [
            Error::is_authentication,
            Error::is_rate_limit,
            Error::is_validation,
            Error::is_network,
            Error::is_api,
        ];

        for (i, err) in errors.iter().enumerate() {
            for (j, check) in checks.iter().enumerate() {
                assert_eq!(check(err), i == j, "error {i} predicate {j}");
            }
        }

        let plain = Error::Other("plain".to_string());
        assert!(checks.iter().all(|check| !check(&plain)));
    }

    #[test]
    fn test_payload_extraction() {
        let err = Error::from(RateLimitError::new(429, "r", "", Duration::from_secs(30)));
        assert_eq!(err.retry_after(), Some(Duration::from_secs(30)));
        assert_eq!(err.validation_field(), None);

        let err = Error::validation("post_id", "Post ID is required");
        assert_eq!(err.validation_field(), Some("post_id"));
        assert_eq!(err.code(), Some(400));

        let err = Error::from(NetworkError::new(0, "timeout", "", true));
        assert!(err.is_temporary());
        assert!(!Error::Cancelled.is_temporary());
    }

    #[test]
    fn test_find_in_anyhow_chain() {
        let err = anyhow::Error::from(Error::not_authenticated("no token"))
            .context("Failed to fetch post");
        let found = Error::find(&err).unwrap();
        assert!(found.is_authentication());

        let unrelated = anyhow::anyhow!("something else");
        assert!(Error::find(&unrelated).is_none());
    }

    #[test]
    fn test_cancelled_is_distinct_from_timeout() {
        assert!(Error::Cancelled.is_cancelled());
        assert!(!Error::Cancelled.is_timeout());
        assert!(Error::Timeout("poll".into()).is_timeout());
        assert!(!Error::Timeout("poll".into()).is_network());
    }
}
