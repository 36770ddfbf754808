//! Turning errors into something a person can act on

use std::fmt;

use crate::error::Error;

/// Exit code for success
pub const EXIT_OK: i32 = 0;
/// Exit code for anything not covered below
pub const EXIT_FAILURE: i32 = 1;
/// Exit code when authentication failed or is missing
pub const EXIT_AUTH: i32 = 2;
/// Exit code for invalid input
pub const EXIT_VALIDATION: i32 = 3;

/// An error with an optional hint on what to do next
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserFriendlyError {
    /// What went wrong
    pub message: String,
    /// What to try
    pub suggestion: Option<String>,
    /// Full underlying error chain
    pub cause: String,
}

impl fmt::Display for UserFriendlyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error: {}", self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n  Suggestion: {suggestion}")?;
        }
        Ok(())
    }
}

impl std::error::Error for UserFriendlyError {}

fn suggestion_for(err: &Error) -> Option<String> {
    let suggestion = match err {
        Error::Authentication(auth) => {
            let text = format!("{} {}", auth.message, auth.details).to_lowercase();
            if text.contains("expired") {
                "Your token has expired. Run `threads auth refresh`, or `threads auth login` if refreshing fails".to_string()
            } else if auth.code == 403 {
                "The token lacks a required permission. Check the app's scopes and log in again with `threads auth login`".to_string()
            } else {
                "Run `threads auth login` to authenticate".to_string()
            }
        }
        Error::RateLimit(limit) => {
            let secs = limit.retry_after.as_secs();
            if secs > 0 {
                format!("Rate limited. Wait {secs}s before retrying; see `threads ratelimit status`")
            } else {
                "Rate limited. Check `threads ratelimit status` before retrying".to_string()
            }
        }
        Error::Validation(validation) => {
            format!("Check the value given for `{}`", validation.field)
        }
        Error::Network(network) => {
            let text = format!("{} {}", network.message, network.details).to_lowercase();
            if text.contains("timed out") || text.contains("timeout") {
                "The request timed out. Check your connection or raise `http_timeout_secs`".to_string()
            } else if text.contains("dns") || text.contains("resolve") {
                "The API host could not be resolved. Check DNS and the `base_url` setting".to_string()
            } else if network.temporary {
                "This looks transient. Try again in a moment".to_string()
            } else {
                "Check your network, proxy and TLS settings".to_string()
            }
        }
        Error::Api(api) if api.code == 404 || api.code == 410 => {
            "Check the id. The resource may not exist or may have been deleted".to_string()
        }
        Error::Timeout(_) => {
            "Media is still processing. Raise `poll_timeout_secs` and try again".to_string()
        }
        _ => return None,
    };
    Some(suggestion)
}

/// Wrap `err` with a message and a suggestion
pub fn format_error(err: &anyhow::Error) -> UserFriendlyError {
    let cause = format!("{err:#}");
    match Error::find(err) {
        Some(Error::Cancelled) => UserFriendlyError {
            message: "Operation cancelled".to_string(),
            suggestion: None,
            cause,
        },
        Some(api_err) => UserFriendlyError {
            message: api_err.to_string(),
            suggestion: suggestion_for(api_err),
            cause,
        },
        None => UserFriendlyError {
            message: err.to_string(),
            suggestion: None,
            cause,
        },
    }
}

/// Process exit code for `err`
pub fn exit_code(err: &anyhow::Error) -> i32 {
    match Error::find(err) {
        Some(Error::Authentication(_)) => EXIT_AUTH,
        Some(Error::Validation(_)) => EXIT_VALIDATION,
        _ => EXIT_FAILURE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, AuthenticationError, NetworkError, RateLimitError};
    use anyhow::Context;
    use std::time::Duration;

    fn wrap(err: impl Into<Error>) -> anyhow::Error {
        Err::<(), _>(err.into())
            .context("Failed to fetch post")
            .unwrap_err()
    }

    #[test]
    fn test_expired_token_suggests_refresh() {
        let err = wrap(AuthenticationError::new(401, "Error validating access token: Session has expired", ""));
        let friendly = format_error(&err);
        assert!(friendly.suggestion.unwrap().contains("threads auth refresh"));
        assert_eq!(exit_code(&err), EXIT_AUTH);
    }

    #[test]
    fn test_invalid_and_forbidden_tokens() {
        let invalid = format_error(&wrap(AuthenticationError::new(401, "Invalid OAuth access token", "")));
        assert!(invalid.suggestion.unwrap().contains("threads auth login"));

        let forbidden = format_error(&wrap(AuthenticationError::new(403, "Permission denied", "")));
        assert!(forbidden.suggestion.unwrap().contains("scopes"));
    }

    #[test]
    fn test_rate_limit_mentions_wait() {
        let friendly = format_error(&wrap(RateLimitError::new(429, "Too many calls", "", Duration::from_secs(90))));
        let suggestion = friendly.suggestion.unwrap();
        assert!(suggestion.contains("90s"));
        assert!(suggestion.contains("threads ratelimit status"));
    }

    #[test]
    fn test_validation_exit_code_and_field() {
        let err = wrap(Error::validation("text", "text is required"));
        assert_eq!(exit_code(&err), EXIT_VALIDATION);
        assert!(format_error(&err).suggestion.unwrap().contains("`text`"));
    }

    #[test]
    fn test_network_wording() {
        let timeout = format_error(&wrap(NetworkError::new(0, "request timed out", "", true)));
        assert!(timeout.suggestion.unwrap().contains("timed out"));

        let dns = format_error(&wrap(NetworkError::new(0, "DNS lookup failed", "", false)));
        assert!(dns.suggestion.unwrap().contains("DNS"));

        let flaky = format_error(&wrap(NetworkError::new(503, "server error", "", true)));
        assert!(flaky.suggestion.unwrap().contains("transient"));
    }

    #[test]
    fn test_plain_errors_pass_through() {
        let err = anyhow::anyhow!("No account configured");
        let friendly = format_error(&err);
        assert_eq!(friendly.message, "No account configured");
        assert!(friendly.suggestion.is_none());
        assert_eq!(exit_code(&err), EXIT_FAILURE);

        let not_found = format_error(&wrap(ApiError::new(404, "not found", "", "")));
        assert!(not_found.suggestion.is_some());
        assert_eq!(
            format_error(&wrap(Error::Cancelled)).message,
            "Operation cancelled"
        );
    }

    #[test]
    fn test_display_includes_suggestion() {
        let friendly = UserFriendlyError {
            message: "boom".into(),
            suggestion: Some("try again".into()),
            cause: String::new(),
        };
        assert_eq!(friendly.to_string(), "Error: boom\n  Suggestion: try again");
    }
}
