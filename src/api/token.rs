//! Access token lifecycle and OAuth operations
//!
//! A client holds at most one token. It moves between three states:
//!
//! ```text
//!   Unset ──set / exchange──▶ Valid ──expiry passes──▶ Expired
//!                               ▲                         │
//!                               └──────── refresh ────────┘
//! ```
//!
//! Token replacement is wholesale under a write lock. Refreshes are
//! serialized by a separate async gate so concurrent callers that find the
//! token expired trigger a single refresh between them.

use std::fmt;
use std::sync::RwLock;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rand::Rng;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::Client;
use super::builder::Params;
use super::transport::ApiRequest;
use crate::error::{AuthenticationError, Error, Result};
use crate::models::{DebugTokenResponse, LongLivedTokenResponse, TokenResponse};

/// Lifetime assumed for short-lived tokens that do not report one
const SHORT_LIVED_TTL_SECS: i64 = 3600;

/// The token a client authenticates with
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Bearer token
    pub access_token: String,
    /// Usually `bearer`
    pub token_type: String,
    /// When the token stops working (`None` = never or unknown)
    pub expires_at: Option<DateTime<Utc>>,
    /// Owner of the token
    pub user_id: String,
    /// Owner's handle, once known
    #[serde(default)]
    pub username: String,
    /// When this token was obtained
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for TokenInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenInfo")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .field("user_id", &self.user_id)
            .field("username", &self.username)
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl TokenInfo {
    /// Token that expires `expires_in_secs` from now (`None` = no known expiry)
    pub fn new(
        access_token: impl Into<String>,
        user_id: impl Into<String>,
        expires_in_secs: Option<i64>,
    ) -> Self {
        let now = Utc::now();
        Self {
            access_token: access_token.into(),
            token_type: "bearer".to_string(),
            expires_at: expires_in_secs.map(|secs| now + ChronoDuration::seconds(secs)),
            user_id: user_id.into(),
            username: String::new(),
            created_at: now,
        }
    }

    /// Same token with the owner's handle attached
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    /// Whether the expiry has passed (never true without an expiry)
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Utc::now() >= at)
    }

    /// Whether the token expires within `window` (expired counts)
    pub fn is_expiring_soon(&self, window: ChronoDuration) -> bool {
        self.expires_at
            .is_some_and(|at| at - Utc::now() <= window)
    }
}

/// Where a client's token stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    /// No token
    Unset,
    /// Token present and not expired
    Valid,
    /// Token present but past its expiry
    Expired,
}

/// Thread-safe holder for one token
#[derive(Debug, Default)]
pub struct TokenManager {
    current: RwLock<Option<TokenInfo>>,
    refresh_gate: tokio::sync::Mutex<()>,
}

impl TokenManager {
    /// Manager with no token
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the token
    pub fn set_token_info(&self, info: TokenInfo) {
        match self.current.write() {
            Ok(mut guard) => *guard = Some(info),
            Err(poisoned) => *poisoned.into_inner() = Some(info),
        }
    }

    /// Drop the token
    pub fn clear(&self) {
        match self.current.write() {
            Ok(mut guard) => *guard = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
    }

    /// Copy of the token
    pub fn token_info(&self) -> Option<TokenInfo> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Bearer token, empty when unset
    pub fn access_token(&self) -> String {
        self.token_info()
            .map(|info| info.access_token)
            .unwrap_or_default()
    }

    /// Owner id, when known
    pub fn user_id(&self) -> Option<String> {
        self.token_info()
            .map(|info| info.user_id)
            .filter(|id| !id.is_empty())
    }

    /// Attach the owner's identity unless the token belongs to someone else
    pub fn record_owner(&self, user_id: &str, username: &str) {
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(info) = guard.as_mut()
            && (info.user_id.is_empty() || info.user_id == user_id)
        {
            info.user_id = user_id.to_string();
            info.username = username.to_string();
        }
    }

    /// Current state
    pub fn state(&self) -> TokenState {
        match self.token_info() {
            None => TokenState::Unset,
            Some(info) if info.is_expired() => TokenState::Expired,
            Some(_) => TokenState::Valid,
        }
    }
}

/// Authorization URL plus the state value to check on the redirect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    /// Where to send the user
    pub url: String,
    /// Random value the redirect must echo back
    pub state: String,
}

fn random_state() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn require_token(info: Option<TokenInfo>, operation: &str) -> Result<TokenInfo> {
    info.ok_or_else(|| {
        AuthenticationError::new(
            401,
            format!("no access token available for {operation}"),
            "authenticate first",
        )
        .into()
    })
}

impl Client {
    /// Authorization URL and the matching state value
    pub fn authorization_request(&self, scopes: &[String]) -> AuthorizationRequest {
        let config = self.config();
        let scopes = if scopes.is_empty() {
            config.scopes.clone()
        } else {
            scopes.to_vec()
        };
        let state = random_state();
        let url = format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
            config.authorize_url,
            urlencoding::encode(&config.client_id),
            urlencoding::encode(&config.redirect_uri),
            urlencoding::encode(&scopes.join(",")),
            state,
        );
        AuthorizationRequest { url, state }
    }

    /// Authorization URL with a fresh random state
    pub fn get_auth_url(&self, scopes: &[String]) -> String {
        self.authorization_request(scopes).url
    }

    /// Trade an authorization code for a short-lived token and install it
    pub async fn exchange_code_for_token(&self, code: &str) -> Result<TokenResponse> {
        let code = code.trim();
        if code.is_empty() {
            return Err(Error::validation("code", "authorization code is required"));
        }
        let config = self.config();
        if config.client_secret.trim().is_empty() {
            return Err(Error::validation(
                "client_secret",
                "client secret is required to exchange a code",
            ));
        }

        let form: Params = [
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.as_str()),
            ("grant_type", "authorization_code"),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("code", code),
        ]
        .into_iter()
        .collect();

        let request = ApiRequest::new(Method::POST, self.root_url("oauth/access_token")).form(form);
        let response: TokenResponse = self.send_json(&request).await?;

        let user_id = response.user_id.map(|id| id.to_string()).unwrap_or_default();
        let ttl = response.expires_in.unwrap_or(SHORT_LIVED_TTL_SECS);
        self.tokens()
            .set_token_info(TokenInfo::new(&response.access_token, user_id, Some(ttl)));
        debug!("Exchanged authorization code for short-lived token");
        Ok(response)
    }

    /// Upgrade the current short-lived token to a long-lived one
    pub async fn get_long_lived_token(&self) -> Result<LongLivedTokenResponse> {
        let current = require_token(self.tokens().token_info(), "long-lived exchange")?;
        let query: Params = [
            ("grant_type", "th_exchange_token"),
            ("client_secret", self.config().client_secret.as_str()),
            ("access_token", current.access_token.as_str()),
        ]
        .into_iter()
        .collect();

        let request = ApiRequest::new(Method::GET, self.root_url("access_token")).query(query);
        let response: LongLivedTokenResponse = self.send_json(&request).await?;
        self.install_long_lived(&current, &response);
        debug!(expires_in = response.expires_in, "Obtained long-lived token");
        Ok(response)
    }

    /// Extend the current long-lived token
    pub async fn refresh_token(&self) -> Result<LongLivedTokenResponse> {
        require_token(self.tokens().token_info(), "refresh")?;
        let _gate = self.cancel_token().run(self.tokens().refresh_gate.lock()).await?;
        self.refresh_locked().await
    }

    /// Caller must hold the refresh gate
    async fn refresh_locked(&self) -> Result<LongLivedTokenResponse> {
        let current = require_token(self.tokens().token_info(), "refresh")?;
        let query: Params = [
            ("grant_type", "th_refresh_token"),
            ("access_token", current.access_token.as_str()),
        ]
        .into_iter()
        .collect();

        let request =
            ApiRequest::new(Method::GET, self.root_url("refresh_access_token")).query(query);
        let response: LongLivedTokenResponse = self.send_json(&request).await?;
        self.install_long_lived(&current, &response);
        debug!(expires_in = response.expires_in, "Refreshed access token");
        Ok(response)
    }

    fn install_long_lived(&self, previous: &TokenInfo, response: &LongLivedTokenResponse) {
        let ttl = (response.expires_in > 0).then_some(response.expires_in);
        let mut info = TokenInfo::new(&response.access_token, &previous.user_id, ttl)
            .with_username(&previous.username);
        if !response.token_type.is_empty() {
            info.token_type.clone_from(&response.token_type);
        }
        self.tokens().set_token_info(info);
    }

    /// Inspect a token (the current one when `input_token` is `None`)
    pub async fn debug_token(&self, input_token: Option<&str>) -> Result<DebugTokenResponse> {
        let current = require_token(self.tokens().token_info(), "token introspection")?;
        let input = input_token
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(&current.access_token);

        let query: Params = [("input_token", input)].into_iter().collect();
        let request = ApiRequest::new(Method::GET, self.graph_url("debug_token"))
            .query(query)
            .bearer(&current.access_token);
        self.send_json(&request).await
    }

    /// Install `token` using the expiry and owner reported by introspection
    pub fn set_token_from_debug_info(
        &self,
        token: &str,
        debug: Option<&DebugTokenResponse>,
    ) -> Result<()> {
        let debug = debug.ok_or_else(|| Error::Other("debug token response is required".into()))?;
        if !debug.data.is_valid {
            return Err(AuthenticationError::new(
                401,
                "token is not valid",
                "introspection reported is_valid=false",
            )
            .into());
        }

        let now = Utc::now();
        let info = TokenInfo {
            access_token: token.to_string(),
            token_type: "bearer".to_string(),
            expires_at: (debug.data.expires_at > 0)
                .then(|| DateTime::from_timestamp(debug.data.expires_at, 0))
                .flatten(),
            user_id: debug.data.user_id.clone(),
            username: String::new(),
            created_at: (debug.data.issued_at > 0)
                .then(|| DateTime::from_timestamp(debug.data.issued_at, 0))
                .flatten()
                .unwrap_or(now),
        };
        self.tokens().set_token_info(info);
        Ok(())
    }

    /// Current bearer token, refreshing once if it has expired
    pub async fn ensure_valid_token(&self) -> Result<String> {
        match self.tokens().token_info() {
            None => {
                return Err(Error::not_authenticated(
                    "no access token set; log in or provide a token",
                ));
            }
            Some(info) if !info.is_expired() => return Ok(info.access_token),
            Some(_) => {}
        }

        let _gate = self.cancel_token().run(self.tokens().refresh_gate.lock()).await?;

        // Another caller may have refreshed while this one waited for the gate.
        // The refreshed token can carry the same string with a later expiry.
        if let Some(info) = self.tokens().token_info()
            && !info.is_expired()
        {
            return Ok(info.access_token);
        }

        warn!("Access token expired, refreshing");
        self.refresh_locked().await?;
        Ok(self.tokens().access_token())
    }

    /// Install a token
    pub fn set_token_info(&self, info: TokenInfo) {
        self.tokens().set_token_info(info);
    }

    /// Current token, if any
    pub fn token_info(&self) -> Option<TokenInfo> {
        self.tokens().token_info()
    }

    /// Bearer token, empty when unset
    pub fn access_token(&self) -> String {
        self.tokens().access_token()
    }

    /// Whether a non-expired token is installed
    pub fn is_authenticated(&self) -> bool {
        self.tokens().state() == TokenState::Valid
    }

    /// Forget the token
    pub fn clear_token(&self) {
        self.tokens().clear();
    }
}
