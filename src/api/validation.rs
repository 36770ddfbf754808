//! Input validation
//!
//! Pure checks that run before any token lookup or network call. Each returns
//! a [`ValidationError`](crate::error::ValidationError) naming the offending
//! field.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex_lite::Regex;
use reqwest::Url;

use crate::error::{Error, Result};
use crate::models::{
    CarouselPostContent, CommonOptions, GIF_PROVIDER_TENOR, GifAttachment, ImagePostContent,
    MediaType, PaginationOptions, PollAttachment, PostsOptions, SearchOptions, TextAttachment,
    TextPostContent, VideoPostContent,
};

/// Maximum post text length in bytes
pub const MAX_TEXT_LENGTH: usize = 500;
/// Maximum unique links per post, link attachment included
pub const MAX_LINKS: usize = 5;
/// Minimum carousel size
pub const MIN_CAROUSEL_ITEMS: usize = 2;
/// Maximum carousel size
pub const MAX_CAROUSEL_ITEMS: usize = 20;
/// Maximum length of one poll option, in characters
pub const MAX_POLL_OPTION_LENGTH: usize = 25;
/// Maximum text attachment length, in characters
pub const MAX_TEXT_ATTACHMENT_LENGTH: usize = 10_000;
/// Earliest `since` accepted by keyword search (2023-07-05)
pub const MIN_SEARCH_TIMESTAMP: i64 = 1_688_540_400;

/// Page size maxima per endpoint
pub mod limits {
    /// User threads listing
    pub const USER_POSTS: u32 = 100;
    /// Ghost posts listing
    pub const GHOST_POSTS: u32 = 100;
    /// Replies and conversation listings
    pub const REPLIES: u32 = 100;
    /// User replies listing
    pub const USER_REPLIES: u32 = 100;
    /// Mentions listing
    pub const MENTIONS: u32 = 100;
    /// Public profile posts listing
    pub const PUBLIC_PROFILE_POSTS: u32 = 100;
    /// Keyword search results
    pub const KEYWORD_SEARCH: u32 = 100;
}

static LINK_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

fn link_pattern() -> Option<&'static Regex> {
    LINK_PATTERN
        .get_or_init(|| Regex::new(r"https?://[^\s]+").ok())
        .as_ref()
}

/// Text must fit in [`MAX_TEXT_LENGTH`] bytes
pub fn validate_text_length(text: &str, field: &str) -> Result<()> {
    if text.len() > MAX_TEXT_LENGTH {
        return Err(Error::validation(
            field,
            format!(
                "text is {} bytes, maximum is {MAX_TEXT_LENGTH}",
                text.len()
            ),
        ));
    }
    Ok(())
}

/// Topic tags may not contain `.` or `&`; empty means no tag
pub fn validate_topic_tag(tag: &str) -> Result<()> {
    if tag.contains(['.', '&']) {
        return Err(Error::validation(
            "topic_tag",
            "topic tag cannot contain '.' or '&'",
        ));
    }
    Ok(())
}

/// Each code must be two uppercase ASCII letters
pub fn validate_country_codes(codes: &[String]) -> Result<()> {
    for code in codes {
        let valid = code.len() == 2 && code.bytes().all(|b| b.is_ascii_uppercase());
        if !valid {
            return Err(Error::validation(
                "allowlisted_country_codes",
                format!("invalid country code {code:?}, expected ISO 3166-1 alpha-2 like \"US\""),
            ));
        }
    }
    Ok(())
}

/// Unique links in `text` plus the link attachment
pub fn count_links(text: &str, link_attachment: &str) -> usize {
    let mut links: HashSet<&str> = link_pattern()
        .map(|re| re.find_iter(text).map(|m| m.as_str()).collect())
        .unwrap_or_default();
    if !link_attachment.is_empty() {
        links.insert(link_attachment);
    }
    links.len()
}

/// At most [`MAX_LINKS`] unique links
pub fn validate_link_count(text: &str, link_attachment: &str) -> Result<()> {
    let count = count_links(text, link_attachment);
    if count > MAX_LINKS {
        return Err(Error::validation(
            "text",
            format!("post contains {count} unique links, maximum is {MAX_LINKS}"),
        ));
    }
    Ok(())
}

/// Carousels need between 2 and 20 items
pub fn validate_carousel_children(count: usize) -> Result<()> {
    if !(MIN_CAROUSEL_ITEMS..=MAX_CAROUSEL_ITEMS).contains(&count) {
        return Err(Error::validation(
            "children",
            format!(
                "carousel needs {MIN_CAROUSEL_ITEMS} to {MAX_CAROUSEL_ITEMS} items, got {count}"
            ),
        ));
    }
    Ok(())
}

/// Media URLs must be present and absolute http(s)
pub fn validate_media_url(url: &str, field: &str) -> Result<()> {
    if url.trim().is_empty() {
        return Err(Error::validation(field, "media URL is required"));
    }
    let parsed =
        Url::parse(url).map_err(|e| Error::validation(field, format!("invalid URL: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::validation(field, "media URL must use http or https"));
    }
    Ok(())
}

/// GIFs need an id and the Tenor provider
pub fn validate_gif_attachment(gif: Option<&GifAttachment>) -> Result<()> {
    let Some(gif) = gif else {
        return Ok(());
    };
    if gif.gif_id.trim().is_empty() {
        return Err(Error::validation(
            "gif_attachment.gif_id",
            "GIF id is required",
        ));
    }
    if gif.provider != GIF_PROVIDER_TENOR {
        return Err(Error::validation(
            "gif_attachment.provider",
            format!("GIF provider must be {GIF_PROVIDER_TENOR}"),
        ));
    }
    Ok(())
}

/// Options A and B are required, D needs C, each fits [`MAX_POLL_OPTION_LENGTH`]
pub fn validate_poll_attachment(poll: Option<&PollAttachment>) -> Result<()> {
    let Some(poll) = poll else {
        return Ok(());
    };

    let required = [("option_a", &poll.option_a), ("option_b", &poll.option_b)];
    for (name, value) in required {
        if value.trim().is_empty() {
            return Err(Error::validation(
                format!("poll_attachment.{name}"),
                "poll option is required",
            ));
        }
    }

    if poll.option_d.is_some() && poll.option_c.as_deref().is_none_or(|c| c.trim().is_empty()) {
        return Err(Error::validation(
            "poll_attachment.option_c",
            "option_c is required when option_d is set",
        ));
    }

    let all = [
        ("option_a", Some(poll.option_a.as_str())),
        ("option_b", Some(poll.option_b.as_str())),
        ("option_c", poll.option_c.as_deref()),
        ("option_d", poll.option_d.as_deref()),
    ];
    for (name, value) in all {
        if let Some(value) = value
            && value.chars().count() > MAX_POLL_OPTION_LENGTH
        {
            return Err(Error::validation(
                format!("poll_attachment.{name}"),
                format!("poll options are limited to {MAX_POLL_OPTION_LENGTH} characters"),
            ));
        }
    }
    Ok(())
}

/// Text attachments need a body within [`MAX_TEXT_ATTACHMENT_LENGTH`]
pub fn validate_text_attachment(attachment: Option<&TextAttachment>) -> Result<()> {
    let Some(attachment) = attachment else {
        return Ok(());
    };
    if attachment.plaintext.trim().is_empty() {
        return Err(Error::validation(
            "text_attachment.plaintext",
            "text attachment body is required",
        ));
    }
    if attachment.plaintext.chars().count() > MAX_TEXT_ATTACHMENT_LENGTH {
        return Err(Error::validation(
            "text_attachment.plaintext",
            format!("text attachment is limited to {MAX_TEXT_ATTACHMENT_LENGTH} characters"),
        ));
    }
    if let Some(url) = attachment.link_attachment_url.as_deref() {
        validate_media_url(url, "text_attachment.link_attachment_url")?;
    }
    Ok(())
}

/// Page size must be between 1 and the endpoint's maximum
pub fn validate_pagination(opts: Option<&PaginationOptions>, max_limit: u32) -> Result<()> {
    let Some(limit) = opts.and_then(|o| o.limit) else {
        return Ok(());
    };
    if limit == 0 || limit > max_limit {
        return Err(Error::validation(
            "limit",
            format!("limit must be between 1 and {max_limit}, got {limit}"),
        ));
    }
    Ok(())
}

/// Pagination plus a sane time window
pub fn validate_posts_options(opts: &PostsOptions, max_limit: u32) -> Result<()> {
    validate_pagination(Some(&opts.pagination), max_limit)?;
    validate_time_window(opts.since, opts.until, 0)
}

fn validate_time_window(since: Option<i64>, until: Option<i64>, min_since: i64) -> Result<()> {
    if let Some(since) = since
        && since < min_since
    {
        return Err(Error::validation(
            "since",
            format!("since must be at or after {min_since}"),
        ));
    }
    if let (Some(since), Some(until)) = (since, until)
        && until < since
    {
        return Err(Error::validation("until", "until must not be before since"));
    }
    Ok(())
}

/// Keyword search options
pub fn validate_search_options(opts: &SearchOptions) -> Result<()> {
    validate_pagination(Some(&opts.pagination), limits::KEYWORD_SEARCH)?;
    validate_time_window(opts.since, opts.until, MIN_SEARCH_TIMESTAMP)?;
    if let Some(author) = opts.author_username.as_deref()
        && author.trim().trim_start_matches('@').is_empty()
    {
        return Err(Error::validation(
            "author_username",
            "author username must not be blank",
        ));
    }
    Ok(())
}

/// Ghost posts cannot be replies
pub fn validate_ghost_post(is_ghost_post: bool, reply_to_id: Option<&str>) -> Result<()> {
    if is_ghost_post && reply_to_id.is_some_and(|id| !id.trim().is_empty()) {
        return Err(Error::validation(
            "is_ghost_post",
            "ghost posts cannot be replies",
        ));
    }
    Ok(())
}

/// Coordinates must be on the globe
pub fn validate_coordinates(latitude: Option<f64>, longitude: Option<f64>) -> Result<()> {
    match (latitude, longitude) {
        (Some(_), None) => Err(Error::validation(
            "longitude",
            "longitude is required with latitude",
        )),
        (None, Some(_)) => Err(Error::validation(
            "latitude",
            "latitude is required with longitude",
        )),
        (Some(lat), _) if !(-90.0..=90.0).contains(&lat) => Err(Error::validation(
            "latitude",
            "latitude must be between -90 and 90",
        )),
        (_, Some(lon)) if !(-180.0..=180.0).contains(&lon) => Err(Error::validation(
            "longitude",
            "longitude must be between -180 and 180",
        )),
        _ => Ok(()),
    }
}

fn validate_common(options: &CommonOptions, text: &str, link_attachment: &str) -> Result<()> {
    validate_text_length(text, "text")?;
    validate_link_count(text, link_attachment)?;
    if let Some(tag) = options.topic_tag.as_deref() {
        validate_topic_tag(tag)?;
    }
    validate_country_codes(&options.allowlisted_country_codes)?;
    Ok(())
}

/// Everything a text post can get wrong
pub fn validate_text_post(content: &TextPostContent) -> Result<()> {
    let has_attachment = content.gif_attachment.is_some()
        || content.text_attachment.is_some()
        || content.poll_attachment.is_some();
    if content.text.trim().is_empty() && !has_attachment {
        return Err(Error::validation("text", "text is required"));
    }

    let link = content.link_attachment.as_deref().unwrap_or_default();
    if !link.is_empty() {
        validate_media_url(link, "link_attachment")?;
    }
    validate_common(&content.options, &content.text, link)?;
    validate_poll_attachment(content.poll_attachment.as_ref())?;
    validate_gif_attachment(content.gif_attachment.as_ref())?;
    validate_text_attachment(content.text_attachment.as_ref())?;
    validate_ghost_post(content.is_ghost_post, content.options.reply_to_id.as_deref())?;
    Ok(())
}

/// Image post
pub fn validate_image_post(content: &ImagePostContent) -> Result<()> {
    validate_media_url(&content.image_url, "image_url")?;
    validate_common(&content.options, &content.text, "")
}

/// Video post
pub fn validate_video_post(content: &VideoPostContent) -> Result<()> {
    validate_media_url(&content.video_url, "video_url")?;
    validate_common(&content.options, &content.text, "")
}

/// Carousel post, items included
pub fn validate_carousel_post(content: &CarouselPostContent) -> Result<()> {
    validate_carousel_children(content.items.len())?;
    for (i, item) in content.items.iter().enumerate() {
        if !matches!(item.media_type, MediaType::Image | MediaType::Video) {
            return Err(Error::validation(
                format!("children[{i}].media_type"),
                "carousel items must be images or videos",
            ));
        }
        validate_media_url(&item.url, &format!("children[{i}].url"))?;
    }
    validate_common(&content.options, &content.text, "")
}
