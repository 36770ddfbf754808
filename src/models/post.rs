//! Post, reply and paging models

use serde::{Deserialize, Serialize};

use super::{PostId, Timestamp, UserId};

/// A post or reply as returned by the API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Post {
    /// Post id
    pub id: PostId,
    /// `TEXT_POST`, `IMAGE`, `VIDEO`, `CAROUSEL_ALBUM`, `AUDIO`, `REPOST_FACADE`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    /// Always `THREADS` today
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_product_type: Option<String>,
    /// Post body
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Author username
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Author
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<Owner>,
    /// Public URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permalink: Option<String>,
    /// When the post was published
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
    /// Short code used in the permalink
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortcode: Option<String>,
    /// Media URL for image and video posts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    /// Video thumbnail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    /// Alt text of the media
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
    /// Link attachment URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_attachment_url: Option<String>,
    /// Topic tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_tag: Option<String>,
    /// Whether this post quotes another
    pub is_quote_post: bool,
    /// Whether this post is a reply
    pub is_reply: bool,
    /// Whether the viewer owns the reply
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_reply_owned_by_me: Option<bool>,
    /// Whether the post has replies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_replies: Option<bool>,
    /// Hide status of a reply (`NOT_HUSHED`, `HIDDEN`, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide_status: Option<String>,
    /// Who may reply
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_audience: Option<String>,
    /// Whether this is a ghost post
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_ghost_post: Option<bool>,
    /// Ghost post expiry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ghost_post_expiration_timestamp: Option<Timestamp>,
    /// Quoted post reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quoted_post: Option<PostRef>,
    /// Reposted post reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reposted_post: Option<PostRef>,
    /// Root of the conversation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_post: Option<PostRef>,
    /// Post this one replies to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replied_to: Option<PostRef>,
    /// Carousel children
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Children>,
    /// GIF URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gif_url: Option<String>,
    /// Tagged location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,
}

/// Replies share the post shape
pub type Reply = Post;

/// Author reference
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    /// User id
    pub id: UserId,
}

/// Reference to another post
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRef {
    /// Post id
    pub id: PostId,
}

/// Carousel children
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Children {
    /// Child references
    #[serde(default)]
    pub data: Vec<PostRef>,
}

/// Cursor pair
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cursors {
    /// Cursor for the previous page
    pub before: String,
    /// Cursor for the next page
    pub after: String,
}

/// Paging block of a list response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Paging {
    /// Cursor pair
    pub cursors: Cursors,
    /// Full URL of the next page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    /// Full URL of the previous page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
}

/// A page of results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    /// Paging cursors
    #[serde(default)]
    pub paging: Paging,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            paging: Paging::default(),
        }
    }
}

impl<T> Page<T> {
    /// Cursor to request the next page, if there is one
    pub fn next_cursor(&self) -> Option<&str> {
        let after = self.paging.cursors.after.as_str();
        (!after.is_empty()).then_some(after)
    }
}

/// Page of posts
pub type PostsResponse = Page<Post>;
/// Page of replies
pub type RepliesResponse = Page<Reply>;

/// Quota window configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaConfig {
    /// Allowed calls in the window
    pub quota_total: u64,
    /// Window length in seconds
    pub quota_duration: u64,
}

/// Publishing quota usage for the current user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishingLimits {
    /// Posts published in the window
    pub quota_usage: u64,
    /// Post quota configuration
    pub config: QuotaConfig,
    /// Replies published in the window
    pub reply_quota_usage: u64,
    /// Reply quota configuration
    pub reply_config: QuotaConfig,
}

/// Result of a repost call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepostResult {
    /// Id of the repost
    pub id: PostId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_from_api_body() {
        let json = r#"{
            "id": "123456789",
            "media_type": "TEXT",
            "text": "Hello, Threads!",
            "username": "testuser",
            "timestamp": "2024-06-15T10:30:00+0000",
            "is_quote_post": false
        }"#;
        let post: Post = serde_json::from_str(json).unwrap();
        assert_eq!(post.id.as_str(), "123456789");
        assert_eq!(post.text.as_deref(), Some("Hello, Threads!"));
        assert_eq!(post.timestamp.unwrap().to_string(), "2024-06-15T10:30:00Z");
    }

    #[test]
    fn test_page_with_cursors() {
        let json = r#"{
            "data": [{"id": "1"}, {"id": "2"}],
            "paging": {"cursors": {"before": "b", "after": "a"}}
        }"#;
        let page: PostsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.next_cursor(), Some("a"));

        let empty: PostsResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.data.is_empty());
        assert_eq!(empty.next_cursor(), None);
    }

    #[test]
    fn test_publishing_limits() {
        let json = r#"{"quota_usage": 10, "config": {"quota_total": 250, "quota_duration": 86400}}"#;
        let limits: PublishingLimits = serde_json::from_str(json).unwrap();
        assert_eq!(limits.quota_usage, 10);
        assert_eq!(limits.config.quota_duration, 86400);
        assert_eq!(limits.reply_quota_usage, 0);
    }
}
