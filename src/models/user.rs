//! User models

use serde::{Deserialize, Serialize};

use super::UserId;

/// The authenticated user, or any user looked up by id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    /// User id
    pub id: UserId,
    /// Handle without the leading `@`
    pub username: String,
    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Avatar URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads_profile_picture_url: Option<String>,
    /// Bio
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads_biography: Option<String>,
    /// Verification badge
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_verified: Option<bool>,
    /// Recent keyword searches (own profile only)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub recently_searched_keywords: Vec<SearchedKeyword>,
}

/// A keyword the user searched recently
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchedKeyword {
    /// Search query
    pub query: String,
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
}

/// A public profile resolved by username
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublicUser {
    /// Handle
    pub username: String,
    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Avatar URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture_url: Option<String>,
    /// Bio
    #[serde(skip_serializing_if = "Option::is_none")]
    pub biography: Option<String>,
    /// Verification badge
    pub is_verified: bool,
    /// Followers
    pub follower_count: u64,
    /// Likes across posts
    pub likes_count: u64,
    /// Quotes across posts
    pub quotes_count: u64,
    /// Replies across posts
    pub replies_count: u64,
    /// Reposts across posts
    pub reposts_count: u64,
    /// Views across posts
    pub views_count: u64,
}

/// Fields that may be requested on a user node
pub const USER_FIELDS: [&str; 7] = [
    "id",
    "username",
    "name",
    "threads_profile_picture_url",
    "threads_biography",
    "is_verified",
    "recently_searched_keywords",
];

/// Fields requested when none are specified
pub const DEFAULT_USER_FIELDS: &str =
    "id,username,name,threads_profile_picture_url,threads_biography,is_verified";
