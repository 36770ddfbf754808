//! Replies, conversations and reply moderation

use tracing::info;

use super::builder::Params;
use super::posts::{POST_FIELDS, require_post_id, require_user_id};
use super::validation::{self, limits};
use super::{Client, list_query};
use crate::error::{ApiError, Result};
use crate::models::{
    PaginationOptions, Post, PostContent, PostId, RepliesOptions, RepliesResponse,
    SuccessResponse, UserId,
};

/// Query for reply listings
///
/// `fields` is always present; `reverse` is sent explicitly whenever the
/// caller set it.
pub fn build_replies_params(opts: Option<&RepliesOptions>, max_limit: u32) -> Result<Params> {
    validation::validate_pagination(opts.map(|o| &o.pagination), max_limit)?;
    let mut query = list_query(POST_FIELDS, opts.map(|o| &o.pagination));
    if let Some(reverse) = opts.and_then(|o| o.reverse) {
        query.set("reverse", if reverse { "true" } else { "false" });
    }
    Ok(query)
}

impl Client {
    /// Direct replies to a post
    pub async fn get_replies(
        &self,
        post_id: &PostId,
        opts: Option<&RepliesOptions>,
    ) -> Result<RepliesResponse> {
        require_post_id(post_id, "post_id")?;
        let query = build_replies_params(opts, limits::REPLIES)?;
        self.get(&format!("{post_id}/replies"), query).await
    }

    /// Every reply in the conversation under a post, flattened
    pub async fn get_conversation(
        &self,
        post_id: &PostId,
        opts: Option<&RepliesOptions>,
    ) -> Result<RepliesResponse> {
        require_post_id(post_id, "post_id")?;
        let query = build_replies_params(opts, limits::REPLIES)?;
        self.get(&format!("{post_id}/conversation"), query).await
    }

    /// Replies a user has written
    pub async fn get_user_replies(
        &self,
        user_id: &UserId,
        pagination: Option<&PaginationOptions>,
    ) -> Result<RepliesResponse> {
        require_user_id(user_id)?;
        validation::validate_pagination(pagination, limits::USER_REPLIES)?;
        self.get(&format!("{user_id}/replies"), list_query(POST_FIELDS, pagination))
            .await
    }

    /// Reply to a post with any kind of content
    pub async fn create_reply(
        &self,
        reply_to: &PostId,
        content: impl Into<PostContent>,
    ) -> Result<Post> {
        require_post_id(reply_to, "reply_to_id")?;
        let mut content = content.into();
        content.options_mut().reply_to_id = Some(reply_to.to_string());
        self.create_post(&content).await
    }

    /// Hide a reply under one of the user's posts
    pub async fn hide_reply(&self, reply_id: &PostId) -> Result<()> {
        self.manage_reply(reply_id, true).await
    }

    /// Show a previously hidden reply
    pub async fn unhide_reply(&self, reply_id: &PostId) -> Result<()> {
        self.manage_reply(reply_id, false).await
    }

    async fn manage_reply(&self, reply_id: &PostId, hide: bool) -> Result<()> {
        require_post_id(reply_id, "reply_id")?;
        let mut form = Params::new();
        form.set("hide", if hide { "true" } else { "false" });

        let response: SuccessResponse = self
            .post(&format!("{reply_id}/manage_reply"), form)
            .await?;
        if !response.success {
            return Err(ApiError::new(
                500,
                format!("reply {reply_id} visibility was not changed"),
                "",
                "",
            )
            .into());
        }
        info!(reply_id = %reply_id, hide, "Updated reply visibility");
        Ok(())
    }
}
