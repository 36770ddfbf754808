//! Client configuration

use std::time::Duration;

use reqwest::Url;

use super::containers::PollConfig;
use super::rate_limit::RateLimiterConfig;
use super::transport::RetryConfig;
use crate::error::{Error, Result};

/// Graph API host
pub const DEFAULT_BASE_URL: &str = "https://graph.threads.net";
/// Authorization page users are sent to
pub const DEFAULT_AUTHORIZE_URL: &str = "https://www.threads.net/oauth/authorize";
/// Versioned path prefix
pub const DEFAULT_API_VERSION: &str = "v1.0";
/// HTTP timeout when none is configured
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Scopes requested when the caller does not pick any
pub const DEFAULT_SCOPES: [&str; 5] = [
    "threads_basic",
    "threads_content_publish",
    "threads_manage_insights",
    "threads_manage_replies",
    "threads_read_replies",
];

/// Every scope the platform knows about
pub const KNOWN_SCOPES: [&str; 10] = [
    "threads_basic",
    "threads_content_publish",
    "threads_manage_insights",
    "threads_manage_replies",
    "threads_read_replies",
    "threads_manage_mentions",
    "threads_keyword_search",
    "threads_location_tagging",
    "threads_profile_discovery",
    "threads_delete",
];

/// Everything a [`Client`](super::Client) needs to talk to the API
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// App id
    pub client_id: String,
    /// App secret (needed for code exchange, long-lived exchange and webhooks)
    pub client_secret: String,
    /// OAuth redirect URI registered for the app
    pub redirect_uri: String,
    /// Requested scopes
    pub scopes: Vec<String>,
    /// Per-request timeout
    pub http_timeout: Duration,
    /// Graph API host
    pub base_url: String,
    /// Authorization page
    pub authorize_url: String,
    /// API version path segment
    pub api_version: String,
    /// User-Agent header
    pub user_agent: String,
    /// Retry policy for transient failures
    pub retry: RetryConfig,
    /// Rate limiter tuning
    pub rate_limit: RateLimiterConfig,
    /// Container polling
    pub poll: PollConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: String::new(),
            scopes: DEFAULT_SCOPES.iter().map(ToString::to_string).collect(),
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            base_url: DEFAULT_BASE_URL.to_string(),
            authorize_url: DEFAULT_AUTHORIZE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            user_agent: default_user_agent(),
            retry: RetryConfig::default(),
            rate_limit: RateLimiterConfig::default(),
            poll: PollConfig::default(),
        }
    }
}

fn default_user_agent() -> String {
    format!("threads-rs/{}", crate::VERSION)
}

impl ClientConfig {
    /// Config for an app
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            ..Self::default()
        }
    }

    /// Read `THREADS_CLIENT_ID`, `THREADS_CLIENT_SECRET` and `THREADS_REDIRECT_URI`
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).unwrap_or_default();
        Self::new(
            var("THREADS_CLIENT_ID"),
            var("THREADS_CLIENT_SECRET"),
            var("THREADS_REDIRECT_URI"),
        )
    }

    /// Fill zero values with defaults
    pub fn set_defaults(&mut self) {
        let defaults = Self::default();
        if self.scopes.is_empty() {
            self.scopes = defaults.scopes;
        }
        if self.http_timeout.is_zero() {
            self.http_timeout = defaults.http_timeout;
        }
        if self.base_url.trim().is_empty() {
            self.base_url = defaults.base_url;
        }
        if self.authorize_url.trim().is_empty() {
            self.authorize_url = defaults.authorize_url;
        }
        if self.api_version.trim().is_empty() {
            self.api_version = defaults.api_version;
        }
        if self.user_agent.trim().is_empty() {
            self.user_agent = defaults.user_agent;
        }
        if self.poll.interval.is_zero() {
            self.poll.interval = defaults.poll.interval;
        }
        if self.poll.timeout.is_zero() {
            self.poll.timeout = defaults.poll.timeout;
        }
        self.base_url = self.base_url.trim_end_matches('/').to_string();
    }

    /// Reject configurations the client cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(Error::validation("client_id", "client id is required"));
        }

        if self.redirect_uri.trim().is_empty() {
            return Err(Error::validation("redirect_uri", "redirect URI is required"));
        }
        let redirect = Url::parse(&self.redirect_uri)
            .map_err(|e| Error::validation("redirect_uri", format!("invalid redirect URI: {e}")))?;
        if !matches!(redirect.scheme(), "http" | "https") {
            return Err(Error::validation(
                "redirect_uri",
                "redirect URI must use http or https",
            ));
        }

        if self.scopes.is_empty() {
            return Err(Error::validation("scopes", "at least one scope is required"));
        }
        for scope in &self.scopes {
            if scope.trim().is_empty() {
                return Err(Error::validation("scopes", "scopes must not be empty"));
            }
            if !KNOWN_SCOPES.contains(&scope.as_str()) {
                return Err(Error::validation("scopes", format!("unknown scope: {scope}")));
            }
        }

        if self.http_timeout.is_zero() {
            return Err(Error::validation("http_timeout", "HTTP timeout must be positive"));
        }

        Url::parse(&self.base_url)
            .map_err(|e| Error::validation("base_url", format!("invalid base URL: {e}")))?;

        if self.retry.backoff_factor < 1.0 {
            return Err(Error::validation(
                "retry.backoff_factor",
                "backoff factor must be at least 1.0",
            ));
        }
        if self.retry.max_delay < self.retry.initial_delay {
            return Err(Error::validation(
                "retry.max_delay",
                "max delay must not be shorter than the initial delay",
            ));
        }

        if !(0.0..=1.0).contains(&self.rate_limit.near_limit_threshold) {
            return Err(Error::validation(
                "rate_limit.near_limit_threshold",
                "threshold must be between 0 and 1",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> ClientConfig {
        ClientConfig::new("id", "secret", "https://example.com/callback")
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "https://graph.threads.net");
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.scopes.len(), 5);
        assert!(config.user_agent.starts_with("threads-rs/"));
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_validation_fields() {
        let cases: Vec<(ClientConfig, &str)> = vec![
            (
                ClientConfig {
                    client_id: String::new(),
                    ..valid()
                },
                "client_id",
            ),
            (
                ClientConfig {
                    redirect_uri: "not a url".into(),
                    ..valid()
                },
                "redirect_uri",
            ),
            (
                ClientConfig {
                    scopes: vec![],
                    ..valid()
                },
                "scopes",
            ),
            (
                ClientConfig {
                    scopes: vec!["threads_basic".into(), "made_up".into()],
                    ..valid()
                },
                "scopes",
            ),
            (
                ClientConfig {
                    http_timeout: Duration::ZERO,
                    ..valid()
                },
                "http_timeout",
            ),
        ];

        for (config, field) in cases {
            let err = config.validate().unwrap_err();
            assert_eq!(err.validation_field(), Some(field));
        }
    }

    #[test]
    fn test_set_defaults_fills_zero_values() {
        let mut config = ClientConfig {
            scopes: vec![],
            http_timeout: Duration::ZERO,
            base_url: "https://graph.threads.net/".into(),
            ..valid()
        };
        config.set_defaults();
        assert_eq!(config.scopes.len(), 5);
        assert_eq!(config.http_timeout, DEFAULT_HTTP_TIMEOUT);
        assert_eq!(config.base_url, "https://graph.threads.net");
    }
}
