//! Threads API client
//!
//! [`Client`] is cheap to clone. Clones share one token, one rate limiter and
//! one transport; [`Client::with_cancel`] gives a clone its own cancellation
//! signal. Every operation follows the same path: validate the input, make
//! sure a usable token exists, build the parameters, then hand the request to
//! the [`HttpClient`] which handles admission, retry and error classification.

pub mod builder;
pub mod cancel;
pub mod config;
pub mod containers;
pub mod locations;
pub mod posts;
pub mod rate_limit;
pub mod replies;
pub mod search;
pub mod token;
pub mod transport;
pub mod users;
pub mod validation;
pub mod webhooks;

use std::fmt;
use std::sync::Arc;

use reqwest::Method;
use serde::de::DeserializeOwned;

pub use builder::{ContainerBuilder, Params};
pub use cancel::CancelToken;
pub use config::ClientConfig;
pub use containers::PollConfig;
pub use rate_limit::{RateLimitStatus, RateLimiter, RateLimiterConfig};
pub use token::{AuthorizationRequest, TokenInfo, TokenManager, TokenState};
pub use transport::{
    ApiRequest, HttpClient, RawResponse, ReqwestTransport, RetryConfig, Transport,
};

use crate::error::Result;
use crate::models::PaginationOptions;

struct Inner {
    config: ClientConfig,
    http: HttpClient,
    tokens: TokenManager,
}

/// Client for one Threads account
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
    cancel: CancelToken,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.inner.config.base_url)
            .field("client_id", &self.inner.config.client_id)
            .field("token_state", &self.inner.tokens.state())
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Client talking HTTP through reqwest
    pub fn new(mut config: ClientConfig) -> Result<Self> {
        config.set_defaults();
        config.validate()?;
        let transport = ReqwestTransport::new(config.http_timeout, &config.user_agent)?;
        Ok(Self::build(config, Arc::new(transport)))
    }

    /// Client using a caller-supplied transport
    pub fn with_transport(mut config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.set_defaults();
        config.validate()?;
        Ok(Self::build(config, transport))
    }

    fn build(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let limiter = Arc::new(RateLimiter::new(config.rate_limit.clone()));
        let http = HttpClient::new(transport, limiter, config.retry);
        Self {
            inner: Arc::new(Inner {
                config,
                http,
                tokens: TokenManager::new(),
            }),
            cancel: CancelToken::new(),
        }
    }

    /// Clone sharing state but observing `cancel`
    #[must_use]
    pub fn with_cancel(&self, cancel: CancelToken) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            cancel,
        }
    }

    /// Signal every blocking wait of this client observes
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Effective configuration
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Shared rate limiter
    pub fn rate_limiter(&self) -> &RateLimiter {
        self.inner.http.rate_limiter()
    }

    /// Shared token holder
    pub fn tokens(&self) -> &TokenManager {
        &self.inner.tokens
    }

    /// `<base>/<version>/<path>`
    pub(crate) fn graph_url(&self, path: &str) -> String {
        let config = &self.inner.config;
        format!(
            "{}/{}/{}",
            config.base_url,
            config.api_version,
            path.trim_start_matches('/')
        )
    }

    /// `<base>/<path>`, for OAuth endpoints outside the versioned tree
    pub(crate) fn root_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.inner.config.base_url,
            path.trim_start_matches('/')
        )
    }

    /// Path segment for the authenticated user
    pub(crate) fn me(&self) -> String {
        self.tokens().user_id().unwrap_or_else(|| "me".to_string())
    }

    /// Send and decode the JSON body
    pub(crate) async fn send_json<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T> {
        let response = self.inner.http.send(request, &self.cancel).await?;
        Ok(serde_json::from_str(&response.body)?)
    }

    async fn authenticated<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: Params,
        form: Params,
    ) -> Result<T> {
        let token = self.ensure_valid_token().await?;
        let request = ApiRequest::new(method, self.graph_url(path))
            .query(query)
            .form(form)
            .bearer(token);
        self.send_json(&request).await
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str, query: Params) -> Result<T> {
        self.authenticated(Method::GET, path, query, Params::new())
            .await
    }

    pub(crate) async fn post<T: DeserializeOwned>(&self, path: &str, form: Params) -> Result<T> {
        self.authenticated(Method::POST, path, Params::new(), form)
            .await
    }

    pub(crate) async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.authenticated(Method::DELETE, path, Params::new(), Params::new())
            .await
    }
}

/// Query holding only `fields`
pub(crate) fn fields_query(fields: &str) -> Params {
    let mut query = Params::new();
    query.set("fields", fields);
    query
}

/// `fields` plus cursor pagination
pub(crate) fn list_query(fields: &str, pagination: Option<&PaginationOptions>) -> Params {
    let mut query = fields_query(fields);
    if let Some(pagination) = pagination {
        if let Some(limit) = pagination.limit {
            query.set("limit", limit.to_string());
        }
        query.set_non_empty("before", pagination.before.as_deref().unwrap_or_default());
        query.set_non_empty("after", pagination.after.as_deref().unwrap_or_default());
    }
    query
}
