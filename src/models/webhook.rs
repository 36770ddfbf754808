//! Webhook subscription models

use serde::{Deserialize, Serialize};

/// A subscribed field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookField {
    /// Field name (`replies`, `mentions`, ...)
    pub name: String,
    /// API version of the subscription
    pub version: String,
}

/// An app-level webhook subscription
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookSubscription {
    /// Subscribed object type (`user`)
    pub object: String,
    /// Endpoint receiving events
    pub callback_url: String,
    /// Whether the subscription is active
    pub active: bool,
    /// Subscribed fields
    pub fields: Vec<WebhookField>,
}

/// List of subscriptions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookSubscriptionsResponse {
    /// Subscriptions
    #[serde(default)]
    pub data: Vec<WebhookSubscription>,
}

/// Acknowledgement returned by mutating calls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessResponse {
    /// Whether the call succeeded
    #[serde(default)]
    pub success: bool,
}
