//! Content the caller asks to publish

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Container media type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MediaType {
    /// Text only
    Text,
    /// Single image
    Image,
    /// Single video
    Video,
    /// Carousel of images and videos
    Carousel,
}

impl MediaType {
    /// Wire value
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Image => "IMAGE",
            Self::Video => "VIDEO",
            Self::Carousel => "CAROUSEL",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who may reply to a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyControl {
    /// Anyone
    Everyone,
    /// Accounts the author follows
    AccountsYouFollow,
    /// Mentioned accounts
    MentionedOnly,
    /// Only the parent post's author
    ParentPostAuthorOnly,
    /// Followers of the author
    FollowersOnly,
}

impl ReplyControl {
    /// Wire value
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Everyone => "everyone",
            Self::AccountsYouFollow => "accounts_you_follow",
            Self::MentionedOnly => "mentioned_only",
            Self::ParentPostAuthorOnly => "parent_post_author_only",
            Self::FollowersOnly => "followers_only",
        }
    }
}

impl FromStr for ReplyControl {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "everyone" => Ok(Self::Everyone),
            "accounts_you_follow" | "following" => Ok(Self::AccountsYouFollow),
            "mentioned_only" | "mentioned" => Ok(Self::MentionedOnly),
            "parent_post_author_only" => Ok(Self::ParentPostAuthorOnly),
            "followers_only" | "followers" => Ok(Self::FollowersOnly),
            other => Err(format!("unknown reply control: {other}")),
        }
    }
}

/// Poll with two to four options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollAttachment {
    /// First option (required)
    pub option_a: String,
    /// Second option (required)
    pub option_b: String,
    /// Third option
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_c: Option<String>,
    /// Fourth option (requires the third)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_d: Option<String>,
}

impl FromStr for PollAttachment {
    type Err = String;

    /// Parse `"yes|no|maybe"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let options: Vec<String> = s.split('|').map(|o| o.trim().to_string()).collect();
        if !(2..=4).contains(&options.len()) {
            return Err("a poll needs 2 to 4 options separated by '|'".to_string());
        }
        let mut options = options.into_iter();
        Ok(Self {
            option_a: options.next().unwrap_or_default(),
            option_b: options.next().unwrap_or_default(),
            option_c: options.next(),
            option_d: options.next(),
        })
    }
}

/// GIF provider accepted by the API
pub const GIF_PROVIDER_TENOR: &str = "TENOR";

/// GIF attachment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GifAttachment {
    /// Provider-side GIF id
    pub gif_id: String,
    /// Provider name, must be `TENOR`
    pub provider: String,
}

impl GifAttachment {
    /// A Tenor GIF
    pub fn tenor(gif_id: impl Into<String>) -> Self {
        Self {
            gif_id: gif_id.into(),
            provider: GIF_PROVIDER_TENOR.to_string(),
        }
    }
}

/// Styled range inside the post text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEntity {
    /// Entity kind (`SPOILER`)
    pub entity_type: String,
    /// Start offset in characters
    pub offset: u32,
    /// Length in characters
    pub length: u32,
}

/// Long-form text attached to a post
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextAttachment {
    /// Body
    pub plaintext: String,
    /// Optional link shown with the attachment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_attachment_url: Option<String>,
}

/// Options shared by every publishable content type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommonOptions {
    /// Post to reply to
    pub reply_to_id: Option<String>,
    /// Post to quote
    pub quoted_post_id: Option<String>,
    /// Who may reply
    pub reply_control: Option<ReplyControl>,
    /// Topic tag
    pub topic_tag: Option<String>,
    /// Country allow-list (ISO 3166-1 alpha-2)
    pub allowlisted_country_codes: Vec<String>,
    /// Tagged location
    pub location_id: Option<String>,
}

/// A text post
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextPostContent {
    /// Body
    pub text: String,
    /// Link preview URL
    pub link_attachment: Option<String>,
    /// Poll
    pub poll_attachment: Option<PollAttachment>,
    /// GIF
    pub gif_attachment: Option<GifAttachment>,
    /// Long-form attachment
    pub text_attachment: Option<TextAttachment>,
    /// Styled ranges
    pub text_entities: Vec<TextEntity>,
    /// Publish in one step without a separate publish call
    pub auto_publish_text: bool,
    /// Ghost post (expires, cannot be a reply)
    pub is_ghost_post: bool,
    /// Shared options
    #[serde(flatten)]
    pub options: CommonOptions,
}

/// An image post
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagePostContent {
    /// Caption
    pub text: String,
    /// Public image URL
    pub image_url: String,
    /// Alt text
    pub alt_text: Option<String>,
    /// Blur the image behind a spoiler overlay
    pub is_spoiler_media: bool,
    /// Shared options
    #[serde(flatten)]
    pub options: CommonOptions,
}

/// A video post
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoPostContent {
    /// Caption
    pub text: String,
    /// Public video URL
    pub video_url: String,
    /// Alt text
    pub alt_text: Option<String>,
    /// Blur the video behind a spoiler overlay
    pub is_spoiler_media: bool,
    /// Shared options
    #[serde(flatten)]
    pub options: CommonOptions,
}

/// One item of a carousel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarouselItem {
    /// `Image` or `Video`
    pub media_type: MediaType,
    /// Public media URL
    pub url: String,
    /// Hide this item behind a spoiler overlay
    #[serde(default)]
    pub is_spoiler_media: bool,
}

impl CarouselItem {
    /// An image item
    pub fn image(url: impl Into<String>) -> Self {
        Self {
            media_type: MediaType::Image,
            url: url.into(),
            is_spoiler_media: false,
        }
    }

    /// A video item
    pub fn video(url: impl Into<String>) -> Self {
        Self {
            media_type: MediaType::Video,
            url: url.into(),
            is_spoiler_media: false,
        }
    }

    /// Same item marked as a spoiler
    #[must_use]
    pub fn spoiler(mut self) -> Self {
        self.is_spoiler_media = true;
        self
    }
}

/// A carousel post
///
/// `alt_texts` apply positionally; entries past the item count are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarouselPostContent {
    /// Caption
    pub text: String,
    /// Items, 2 to 20
    pub items: Vec<CarouselItem>,
    /// Alt text per item
    pub alt_texts: Vec<String>,
    /// Shared options
    #[serde(flatten)]
    pub options: CommonOptions,
}

/// Anything that can be published
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PostContent {
    /// Text post
    Text(TextPostContent),
    /// Image post
    Image(ImagePostContent),
    /// Video post
    Video(VideoPostContent),
    /// Carousel post
    Carousel(CarouselPostContent),
}

impl PostContent {
    /// Shared options of any variant
    pub fn options_mut(&mut self) -> &mut CommonOptions {
        match self {
            Self::Text(c) => &mut c.options,
            Self::Image(c) => &mut c.options,
            Self::Video(c) => &mut c.options,
            Self::Carousel(c) => &mut c.options,
        }
    }
}

impl From<TextPostContent> for PostContent {
    fn from(content: TextPostContent) -> Self {
        Self::Text(content)
    }
}

impl From<ImagePostContent> for PostContent {
    fn from(content: ImagePostContent) -> Self {
        Self::Image(content)
    }
}

impl From<VideoPostContent> for PostContent {
    fn from(content: VideoPostContent) -> Self {
        Self::Video(content)
    }
}

impl From<CarouselPostContent> for PostContent {
    fn from(content: CarouselPostContent) -> Self {
        Self::Carousel(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_from_str() {
        let poll: PollAttachment = "yes | no | maybe".parse().unwrap();
        assert_eq!(poll.option_a, "yes");
        assert_eq!(poll.option_c.as_deref(), Some("maybe"));
        assert_eq!(poll.option_d, None);

        assert!("only".parse::<PollAttachment>().is_err());
        assert!("a|b|c|d|e".parse::<PollAttachment>().is_err());
    }

    #[test]
    fn test_poll_json_skips_missing_options() {
        let poll = PollAttachment {
            option_a: "a".into(),
            option_b: "b".into(),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_string(&poll).unwrap(),
            r#"{"option_a":"a","option_b":"b"}"#
        );
    }

    #[test]
    fn test_reply_control_parsing() {
        assert_eq!(
            "accounts-you-follow".parse::<ReplyControl>().unwrap(),
            ReplyControl::AccountsYouFollow
        );
        assert_eq!(ReplyControl::MentionedOnly.as_str(), "mentioned_only");
        assert!("nobody".parse::<ReplyControl>().is_err());
    }
}
