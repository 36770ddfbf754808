//! Request shaping options for list and search endpoints

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Cursor pagination
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationOptions {
    /// Page size
    pub limit: Option<u32>,
    /// Cursor for the previous page
    pub before: Option<String>,
    /// Cursor for the next page
    pub after: Option<String>,
}

impl PaginationOptions {
    /// Page size only
    pub const fn with_limit(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            before: None,
            after: None,
        }
    }
}

/// Pagination plus a time window, for post listings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostsOptions {
    /// Cursor pagination
    #[serde(flatten)]
    pub pagination: PaginationOptions,
    /// Unix seconds, inclusive lower bound
    pub since: Option<i64>,
    /// Unix seconds, inclusive upper bound
    pub until: Option<i64>,
}

/// Pagination plus ordering, for reply listings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepliesOptions {
    /// Cursor pagination
    #[serde(flatten)]
    pub pagination: PaginationOptions,
    /// Oldest first when true
    pub reverse: Option<bool>,
}

/// Ranking of keyword search results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SearchType {
    /// Most popular
    Top,
    /// Most recent
    Recent,
}

/// Interpretation of the search query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SearchMode {
    /// Free-text keyword
    Keyword,
    /// Topic tag
    Tag,
}

/// Media filter for keyword search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SearchMediaType {
    /// Text posts
    Text,
    /// Image posts
    Image,
    /// Video posts
    Video,
}

macro_rules! wire_enum {
    ($name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        impl $name {
            /// Wire value
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_uppercase().as_str() {
                    $($wire => Ok(Self::$variant),)+
                    other => Err(format!("unknown {}: {other}", stringify!($name))),
                }
            }
        }
    };
}

wire_enum!(SearchType { Top => "TOP", Recent => "RECENT" });
wire_enum!(SearchMode { Keyword => "KEYWORD", Tag => "TAG" });
wire_enum!(SearchMediaType { Text => "TEXT", Image => "IMAGE", Video => "VIDEO" });

/// Keyword search options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Ranking
    pub search_type: Option<SearchType>,
    /// Query interpretation
    pub search_mode: Option<SearchMode>,
    /// Media filter
    pub media_type: Option<SearchMediaType>,
    /// Restrict to one author
    pub author_username: Option<String>,
    /// Cursor pagination
    #[serde(flatten)]
    pub pagination: PaginationOptions,
    /// Unix seconds, lower bound
    pub since: Option<i64>,
    /// Unix seconds, upper bound
    pub until: Option<i64>,
}
