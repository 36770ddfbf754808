//! OAuth token responses

use serde::{Deserialize, Serialize};

/// Response of the authorization code exchange
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Short-lived access token
    pub access_token: String,
    /// Usually `bearer`
    #[serde(default)]
    pub token_type: String,
    /// Lifetime in seconds (absent for short-lived tokens)
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Numeric user id
    #[serde(default)]
    pub user_id: Option<i64>,
}

/// Response of the long-lived exchange and of refresh
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LongLivedTokenResponse {
    /// Long-lived access token
    pub access_token: String,
    /// Usually `bearer`
    #[serde(default)]
    pub token_type: String,
    /// Lifetime in seconds (about 60 days)
    #[serde(default)]
    pub expires_in: i64,
}

/// Introspection payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugTokenData {
    /// Token type (`USER`)
    #[serde(rename = "type")]
    pub token_type: String,
    /// App name
    pub application: String,
    /// Unix time data access ends
    pub data_access_expires_at: i64,
    /// Unix time the token expires (0 = never)
    pub expires_at: i64,
    /// Whether the token is valid
    pub is_valid: bool,
    /// Unix time the token was issued
    pub issued_at: i64,
    /// Granted scopes
    pub scopes: Vec<String>,
    /// Owner id
    pub user_id: String,
}

/// Response of the debug endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugTokenResponse {
    /// Payload
    pub data: DebugTokenData,
}
