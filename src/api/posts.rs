//! Reading, publishing and deleting posts

use futures::future::try_join_all;
use tracing::{debug, info};

use super::builder::{ContainerBuilder, Params};
use super::validation::{self, limits};
use super::{Client, fields_query, list_query};
use crate::error::{ApiError, Error, Result};
use crate::models::{
    CarouselPostContent, CommonOptions, ImagePostContent, MediaType, Page, PaginationOptions,
    Post, PostContent, PostId, PostsOptions, PostsResponse, PublishingLimits, RepostResult,
    SuccessResponse, TextPostContent, UserId, VideoPostContent,
};

/// Fields requested for posts
pub const POST_FIELDS: &str = "id,media_product_type,media_type,media_url,permalink,owner,\
username,text,timestamp,shortcode,thumbnail_url,children,is_quote_post,quoted_post,\
reposted_post,alt_text,link_attachment_url,gif_url,topic_tag,is_reply,root_post,replied_to,\
has_replies,hide_status,reply_audience,is_ghost_post,ghost_post_expiration_timestamp,location_id";

const PUBLISHING_LIMIT_FIELDS: &str = "quota_usage,config,reply_quota_usage,reply_config";

pub(crate) fn require_post_id(id: &PostId, field: &str) -> Result<()> {
    if id.is_valid() {
        Ok(())
    } else {
        Err(Error::validation(field, format!("{field} is required")))
    }
}

pub(crate) fn require_user_id(id: &UserId) -> Result<()> {
    if id.is_valid() {
        Ok(())
    } else {
        Err(Error::validation("user_id", "user_id is required"))
    }
}

fn with_common(builder: ContainerBuilder, options: &CommonOptions) -> ContainerBuilder {
    builder
        .reply_to(options.reply_to_id.as_deref().unwrap_or_default())
        .quote_post_id(options.quoted_post_id.as_deref().unwrap_or_default())
        .reply_control(options.reply_control)
        .topic_tag(options.topic_tag.as_deref().unwrap_or_default())
        .allowlisted_country_codes(&options.allowlisted_country_codes)
        .location_id(options.location_id.as_deref().unwrap_or_default())
}

fn text_params(content: &TextPostContent) -> Params {
    let builder = ContainerBuilder::new()
        .media_type(MediaType::Text)
        .text(&content.text)
        .link_attachment(content.link_attachment.as_deref().unwrap_or_default())
        .poll_attachment(content.poll_attachment.as_ref())
        .gif_attachment(content.gif_attachment.as_ref())
        .text_attachment(content.text_attachment.as_ref())
        .text_entities(&content.text_entities)
        .auto_publish_text(content.auto_publish_text)
        .is_ghost_post(content.is_ghost_post);
    with_common(builder, &content.options).build()
}

fn image_params(content: &ImagePostContent) -> Params {
    let builder = ContainerBuilder::new()
        .media_type(MediaType::Image)
        .image_url(&content.image_url)
        .text(&content.text)
        .alt_text(content.alt_text.as_deref().unwrap_or_default())
        .is_spoiler_media(content.is_spoiler_media);
    with_common(builder, &content.options).build()
}

fn video_params(content: &VideoPostContent) -> Params {
    let builder = ContainerBuilder::new()
        .media_type(MediaType::Video)
        .video_url(&content.video_url)
        .text(&content.text)
        .alt_text(content.alt_text.as_deref().unwrap_or_default())
        .is_spoiler_media(content.is_spoiler_media);
    with_common(builder, &content.options).build()
}

fn carousel_params(content: &CarouselPostContent, children: &[String]) -> Params {
    let builder = ContainerBuilder::new()
        .media_type(MediaType::Carousel)
        .text(&content.text)
        .children(children);
    with_common(builder, &content.options).build()
}

impl Client {
    /// Fetch one post
    pub async fn get_post(&self, id: &PostId) -> Result<Post> {
        require_post_id(id, "post_id")?;
        self.get(id.as_str(), fields_query(POST_FIELDS)).await
    }

    /// A user's posts, newest first
    pub async fn get_user_posts(
        &self,
        user_id: &UserId,
        pagination: Option<&PaginationOptions>,
    ) -> Result<PostsResponse> {
        require_user_id(user_id)?;
        validation::validate_pagination(pagination, limits::USER_POSTS)?;
        let path = format!("{user_id}/threads");
        self.get(&path, list_query(POST_FIELDS, pagination)).await
    }

    /// A user's posts within a time window
    pub async fn get_user_posts_with_options(
        &self,
        user_id: &UserId,
        opts: &PostsOptions,
    ) -> Result<PostsResponse> {
        require_user_id(user_id)?;
        validation::validate_posts_options(opts, limits::USER_POSTS)?;
        let mut query = list_query(POST_FIELDS, Some(&opts.pagination));
        if let Some(since) = opts.since {
            query.set("since", since.to_string());
        }
        if let Some(until) = opts.until {
            query.set("until", until.to_string());
        }
        let path = format!("{user_id}/threads");
        self.get(&path, query).await
    }

    /// A user's ghost posts
    pub async fn get_user_ghost_posts(
        &self,
        user_id: &UserId,
        pagination: Option<&PaginationOptions>,
    ) -> Result<PostsResponse> {
        require_user_id(user_id)?;
        validation::validate_pagination(pagination, limits::GHOST_POSTS)?;
        let path = format!("{user_id}/ghost_posts");
        self.get(&path, list_query(POST_FIELDS, pagination)).await
    }

    /// Delete a post the authenticated user owns
    pub async fn delete_post(&self, id: &PostId) -> Result<()> {
        require_post_id(id, "post_id")?;
        let response: SuccessResponse = self.delete(id.as_str()).await?;
        if !response.success {
            return Err(ApiError::new(
                500,
                format!("post {id} was not deleted"),
                "the API reported success=false",
                "",
            )
            .into());
        }
        info!(post_id = %id, "Deleted post");
        Ok(())
    }

    /// Fetch the post, ask `confirm`, and delete only on `true`
    ///
    /// Returns whether the post was deleted.
    pub async fn delete_post_with_confirmation<F>(
        &self,
        id: &PostId,
        confirm: Option<F>,
    ) -> Result<bool>
    where
        F: FnOnce(&Post) -> bool,
    {
        require_post_id(id, "post_id")?;
        let Some(confirm) = confirm else {
            return Err(Error::validation(
                "confirmation_callback",
                "a confirmation callback is required",
            ));
        };

        let post = self.get_post(id).await?;
        if !confirm(&post) {
            debug!(post_id = %id, "Deletion declined");
            return Ok(false);
        }
        self.delete_post(id).await?;
        Ok(true)
    }

    /// Publish a text post
    pub async fn create_text_post(&self, content: &TextPostContent) -> Result<Post> {
        validation::validate_text_post(content)?;
        let container = self.create_container(text_params(content)).await?;

        // Auto-published containers already are the post
        let post_id = if content.auto_publish_text {
            PostId::new(container.into_inner())
        } else {
            self.publish_container(&container).await?
        };
        self.get_post(&post_id).await
    }

    /// Publish an image post
    pub async fn create_image_post(&self, content: &ImagePostContent) -> Result<Post> {
        validation::validate_image_post(content)?;
        let container = self.create_container(image_params(content)).await?;
        self.wait_for_container(&container).await?;
        let post_id = self.publish_container(&container).await?;
        self.get_post(&post_id).await
    }

    /// Publish a video post
    pub async fn create_video_post(&self, content: &VideoPostContent) -> Result<Post> {
        validation::validate_video_post(content)?;
        let container = self.create_container(video_params(content)).await?;
        self.wait_for_container(&container).await?;
        let post_id = self.publish_container(&container).await?;
        self.get_post(&post_id).await
    }

    /// Publish a carousel
    ///
    /// Items are created and polled concurrently. The carousel container is
    /// only created once every item is ready; any failing item aborts the
    /// whole post before anything is published.
    pub async fn create_carousel_post(&self, content: &CarouselPostContent) -> Result<Post> {
        validation::validate_carousel_post(content)?;

        let items = content.items.iter().enumerate().map(|(i, item)| {
            let alt_text = content.alt_texts.get(i).map(String::as_str);
            self.create_carousel_item(item, alt_text)
        });
        let children: Vec<String> = try_join_all(items)
            .await?
            .into_iter()
            .map(|id| id.into_inner())
            .collect();
        debug!(items = children.len(), "Carousel items ready");

        let container = self
            .create_container(carousel_params(content, &children))
            .await?;
        self.wait_for_container(&container).await?;
        let post_id = self.publish_container(&container).await?;
        self.get_post(&post_id).await
    }

    /// Publish `content` quoting another post
    pub async fn create_quote_post(
        &self,
        content: impl Into<PostContent>,
        quoted_post_id: &PostId,
    ) -> Result<Post> {
        require_post_id(quoted_post_id, "quoted_post_id")?;
        let mut content = content.into();
        content.options_mut().quoted_post_id = Some(quoted_post_id.to_string());
        self.create_post(&content).await
    }

    /// Publish any kind of content
    pub async fn create_post(&self, content: &PostContent) -> Result<Post> {
        match content {
            PostContent::Text(c) => self.create_text_post(c).await,
            PostContent::Image(c) => self.create_image_post(c).await,
            PostContent::Video(c) => self.create_video_post(c).await,
            PostContent::Carousel(c) => self.create_carousel_post(c).await,
        }
    }

    /// Repost onto the authenticated user's profile
    pub async fn repost_post(&self, id: &PostId) -> Result<RepostResult> {
        require_post_id(id, "post_id")?;
        let path = format!("{id}/repost");
        self.post(&path, Params::new()).await
    }

    /// Undo a repost
    pub async fn unrepost_post(&self, id: &PostId) -> Result<()> {
        require_post_id(id, "post_id")?;
        let path = format!("{id}/unrepost");
        let response: SuccessResponse = self.post(&path, Params::new()).await?;
        if response.success {
            Ok(())
        } else {
            Err(ApiError::new(500, format!("repost of {id} was not removed"), "", "").into())
        }
    }

    /// Publishing quota usage of the authenticated user
    pub async fn get_publishing_limits(&self) -> Result<PublishingLimits> {
        let path = format!("{}/threads_publishing_limit", self.me());
        let page: Page<PublishingLimits> =
            self.get(&path, fields_query(PUBLISHING_LIMIT_FIELDS)).await?;
        page.data
            .into_iter()
            .next()
            .ok_or_else(|| Error::Decode("publishing limit response had no data".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::scripted_client;
    use crate::models::{CarouselItem, GifAttachment, PollAttachment, ReplyControl};

    const POST: &str = r#"{"id":"p1","media_type":"TEXT_POST","text":"hello"}"#;

    #[tokio::test]
    async fn test_get_post_requires_id() {
        let (client, transport) = scripted_client(&[]);
        let err = client.get_post(&PostId::new("")).await.unwrap_err();
        assert_eq!(err.validation_field(), Some("post_id"));
        assert!(transport.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_text_post_flow() {
        let (client, transport) =
            scripted_client(&[r#"{"id":"c1"}"#, r#"{"id":"p1"}"#, POST]);
        let content = TextPostContent {
            text: "hello".into(),
            options: CommonOptions {
                reply_control: Some(ReplyControl::MentionedOnly),
                ..Default::default()
            },
            ..Default::default()
        };
        let post = client.create_text_post(&content).await.unwrap();
        assert_eq!(post.id.as_str(), "p1");

        let sent = transport.recorded();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0].form.get("media_type"), Some("TEXT"));
        assert_eq!(sent[0].form.get("text"), Some("hello"));
        assert_eq!(sent[0].form.get("reply_control"), Some("mentioned_only"));
        assert!(!sent[0].form.contains("is_ghost_post"));
        assert_eq!(sent[1].form.get("creation_id"), Some("c1"));
        assert!(sent[2].url.ends_with("/p1"));
    }

    #[tokio::test]
    async fn test_auto_publish_skips_publish_call() {
        let (client, transport) = scripted_client(&[r#"{"id":"p1"}"#, POST]);
        let content = TextPostContent {
            text: "hello".into(),
            auto_publish_text: true,
            ..Default::default()
        };
        client.create_text_post(&content).await.unwrap();
        let sent = transport.recorded();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].form.get("auto_publish_text"), Some("true"));
    }

    #[tokio::test]
    async fn test_attachments_are_json_encoded() {
        let (client, transport) = scripted_client(&[r#"{"id":"c1"}"#, r#"{"id":"p1"}"#, POST]);
        let content = TextPostContent {
            poll_attachment: Some(PollAttachment {
                option_a: "yes".into(),
                option_b: "no".into(),
                ..Default::default()
            }),
            gif_attachment: Some(GifAttachment::tenor("g1")),
            ..Default::default()
        };
        client.create_text_post(&content).await.unwrap();

        let form = &transport.recorded()[0].form;
        let poll: serde_json::Value =
            serde_json::from_str(form.get("poll_attachment").unwrap()).unwrap();
        assert_eq!(poll["option_a"], "yes");
        assert!(form.get("gif_attachment").unwrap().contains("TENOR"));
        assert!(!form.contains("text"));
    }

    #[tokio::test]
    async fn test_invalid_content_sends_nothing() {
        let (client, transport) = scripted_client(&[]);

        let ghost_reply = TextPostContent {
            text: "boo".into(),
            is_ghost_post: true,
            options: CommonOptions {
                reply_to_id: Some("p0".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let err = client.create_text_post(&ghost_reply).await.unwrap_err();
        assert_eq!(err.validation_field(), Some("is_ghost_post"));

        let lonely = CarouselPostContent {
            items: vec![CarouselItem::image("https://example.com/a.jpg")],
            ..Default::default()
        };
        let err = client.create_carousel_post(&lonely).await.unwrap_err();
        assert_eq!(err.validation_field(), Some("children"));

        assert!(transport.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_validation_runs_before_token_check() {
        let (client, _) = scripted_client(&[]);
        client.clear_token();
        let err = client
            .create_text_post(&TextPostContent::default())
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test(start_paused = true)]
    async fn test_image_post_waits_for_container() {
        let (client, transport) = scripted_client(&[
            r#"{"id":"c1"}"#,
            r#"{"id":"c1","status":"IN_PROGRESS"}"#,
            r#"{"id":"c1","status":"FINISHED"}"#,
            r#"{"id":"p1"}"#,
            POST,
        ]);
        let content = ImagePostContent {
            image_url: "https://example.com/cat.jpg".into(),
            alt_text: Some("a cat".into()),
            is_spoiler_media: true,
            ..Default::default()
        };
        client.create_image_post(&content).await.unwrap();

        let sent = transport.recorded();
        assert_eq!(sent.len(), 5);
        assert_eq!(sent[0].form.get("image_url"), Some("https://example.com/cat.jpg"));
        assert_eq!(sent[0].form.get("alt_text"), Some("a cat"));
        assert_eq!(sent[0].form.get("is_spoiler_media"), Some("true"));
        assert_eq!(sent[3].form.get("creation_id"), Some("c1"));
    }

    #[tokio::test]
    async fn test_quote_post_sets_quoted_id() {
        let (client, transport) = scripted_client(&[r#"{"id":"c1"}"#, r#"{"id":"p1"}"#, POST]);
        let content = TextPostContent {
            text: "look".into(),
            ..Default::default()
        };
        client
            .create_quote_post(content, &PostId::new("p0"))
            .await
            .unwrap();
        assert_eq!(transport.recorded()[0].form.get("quote_post_id"), Some("p0"));

        let err = client
            .create_quote_post(TextPostContent::default(), &PostId::new(""))
            .await
            .unwrap_err();
        assert_eq!(err.validation_field(), Some("quoted_post_id"));
    }

    #[tokio::test]
    async fn test_delete_with_confirmation() {
        let (client, transport) = scripted_client(&[POST, POST, r#"{"success":true}"#]);
        let id = PostId::new("p1");

        let err = client
            .delete_post_with_confirmation(&id, None::<fn(&Post) -> bool>)
            .await
            .unwrap_err();
        assert_eq!(err.validation_field(), Some("confirmation_callback"));

        let declined = client
            .delete_post_with_confirmation(&id, Some(|_: &Post| false))
            .await
            .unwrap();
        assert!(!declined);

        let deleted = client
            .delete_post_with_confirmation(&id, Some(|post: &Post| post.text.is_some()))
            .await
            .unwrap();
        assert!(deleted);

        let sent = transport.recorded();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[2].method, reqwest::Method::DELETE);
    }

    #[tokio::test]
    async fn test_pagination_limits() {
        let (client, transport) = scripted_client(&[r#"{"data":[],"paging":{}}"#]);
        let user = UserId::new("u1");

        let err = client
            .get_user_posts(&user, Some(&PaginationOptions::with_limit(101)))
            .await
            .unwrap_err();
        assert_eq!(err.validation_field(), Some("limit"));

        client
            .get_user_posts(&user, Some(&PaginationOptions::with_limit(25)))
            .await
            .unwrap();
        let sent = transport.recorded();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].query.get("limit"), Some("25"));
        assert!(sent[0].url.ends_with("/u1/threads"));
    }

    #[tokio::test]
    async fn test_publishing_limits_first_entry() {
        let (client, _) = scripted_client(&[
            r#"{"data":[{"quota_usage":3,"config":{"quota_total":250,"quota_duration":86400}}]}"#,
        ]);
        let limits = client.get_publishing_limits().await.unwrap();
        assert_eq!(limits.quota_usage, 3);
        assert_eq!(limits.config.quota_total, 250);
    }

    #[tokio::test]
    async fn test_repost_and_unrepost() {
        let (client, transport) =
            scripted_client(&[r#"{"id":"r1"}"#, r#"{"success":true}"#]);
        let id = PostId::new("p1");
        assert_eq!(client.repost_post(&id).await.unwrap().id.as_str(), "r1");
        client.unrepost_post(&id).await.unwrap();

        let sent = transport.recorded();
        assert!(sent[0].url.ends_with("/p1/repost"));
        assert!(sent[1].url.ends_with("/p1/unrepost"));
    }
}
