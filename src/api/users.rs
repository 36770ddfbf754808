//! Users, public profiles and mentions

use tracing::warn;

use super::posts::{POST_FIELDS, require_user_id};
use super::validation::{self, limits};
use super::{Client, fields_query, list_query};
use crate::error::{Error, Result};
use crate::models::{
    DEFAULT_USER_FIELDS, PaginationOptions, PostsResponse, PublicUser, USER_FIELDS, User, UserId,
};

/// Fields requested for public profiles
pub const PUBLIC_PROFILE_FIELDS: &str = "username,name,profile_picture_url,biography,\
is_verified,follower_count,likes_count,quotes_count,replies_count,reposts_count,views_count";

fn normalize_username(username: &str) -> Result<String> {
    let name = username.trim().trim_start_matches('@').trim();
    if name.is_empty() {
        return Err(Error::validation("username", "username is required"));
    }
    Ok(name.to_string())
}

/// Keep the allow-listed fields, in the order given
fn select_fields(requested: &[&str]) -> Result<String> {
    if requested.is_empty() {
        return Ok(DEFAULT_USER_FIELDS.to_string());
    }
    let (known, unknown): (Vec<&str>, Vec<&str>) = requested
        .iter()
        .map(|f| f.trim())
        .partition(|f| USER_FIELDS.contains(f));
    if !unknown.is_empty() {
        warn!(fields = ?unknown, "Dropping unknown user fields");
    }
    if known.is_empty() {
        return Err(Error::validation(
            "fields",
            format!("none of the requested fields are valid; choose from {}", USER_FIELDS.join(",")),
        ));
    }
    Ok(known.join(","))
}

impl Client {
    /// The authenticated user
    ///
    /// The response fills in the owner's id and handle on the current token.
    pub async fn get_me(&self) -> Result<User> {
        let me: User = self.get("me", fields_query(DEFAULT_USER_FIELDS)).await?;
        self.tokens().record_owner(me.id.as_str(), &me.username);
        Ok(me)
    }

    /// A user by id
    pub async fn get_user(&self, user_id: &UserId) -> Result<User> {
        require_user_id(user_id)?;
        self.get(user_id.as_str(), fields_query(DEFAULT_USER_FIELDS))
            .await
    }

    /// A user by id with a chosen field set
    ///
    /// Unknown fields are dropped; an empty list means the default set.
    pub async fn get_user_fields(&self, user_id: &UserId, fields: &[&str]) -> Result<User> {
        require_user_id(user_id)?;
        let fields = select_fields(fields)?;
        self.get(user_id.as_str(), fields_query(&fields)).await
    }

    /// Resolve a public profile by handle (leading `@` optional)
    pub async fn lookup_public_profile(&self, username: &str) -> Result<PublicUser> {
        let username = normalize_username(username)?;
        let mut query = fields_query(PUBLIC_PROFILE_FIELDS);
        query.set("username", username);
        self.get("profile_lookup", query).await
    }

    /// Posts of a public profile
    pub async fn get_public_profile_posts(
        &self,
        username: &str,
        pagination: Option<&PaginationOptions>,
    ) -> Result<PostsResponse> {
        let username = normalize_username(username)?;
        validation::validate_pagination(pagination, limits::PUBLIC_PROFILE_POSTS)?;
        let mut query = list_query(POST_FIELDS, pagination);
        query.set("username", username);
        self.get("profile_posts", query).await
    }

    /// Posts mentioning a user
    pub async fn get_user_mentions(
        &self,
        user_id: &UserId,
        pagination: Option<&PaginationOptions>,
    ) -> Result<PostsResponse> {
        require_user_id(user_id)?;
        validation::validate_pagination(pagination, limits::MENTIONS)?;
        self.get(
            &format!("{user_id}/mentions"),
            list_query(POST_FIELDS, pagination),
        )
        .await
    }
}
