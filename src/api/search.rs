//! Keyword and topic tag search

use super::posts::POST_FIELDS;
use super::validation;
use super::{Client, list_query};
use crate::error::{Error, Result};
use crate::models::{PostsResponse, SearchOptions};

impl Client {
    /// Search public posts
    pub async fn keyword_search(
        &self,
        query: &str,
        opts: Option<&SearchOptions>,
    ) -> Result<PostsResponse> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::validation("query", "search query is required"));
        }
        if let Some(opts) = opts {
            validation::validate_search_options(opts)?;
        }

        let mut params = list_query(POST_FIELDS, opts.map(|o| &o.pagination));
        params.set("q", query);
        if let Some(opts) = opts {
            if let Some(search_type) = opts.search_type {
                params.set("search_type", search_type.as_str());
            }
            if let Some(mode) = opts.search_mode {
                params.set("search_mode", mode.as_str());
            }
            if let Some(media_type) = opts.media_type {
                params.set("media_type", media_type.as_str());
            }
            if let Some(author) = opts.author_username.as_deref() {
                params.set("author_username", author.trim().trim_start_matches('@'));
            }
            if let Some(since) = opts.since {
                params.set("since", since.to_string());
            }
            if let Some(until) = opts.until {
                params.set("until", until.to_string());
            }
        }
        self.get("keyword_search", params).await
    }
}
