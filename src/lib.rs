//! # threads
//!
//! Client library and command-line tool for the Meta Threads API.
//!
//! ## Overview
//!
//! The library wraps the Threads Graph API: OAuth token exchange and refresh,
//! the two-step container/publish flow for text, image, video and carousel
//! posts, reading posts, replies, users and mentions, keyword search,
//! location tagging, reply moderation and webhook subscriptions. Every call
//! goes through one transport that classifies failures, retries transient
//! ones and tracks rate limit headroom.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     CLI (`threads`)                         │
//! │   clap commands, text/JSON output, exit codes, Ctrl-C       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!          ┌───────────────────┼───────────────────┐
//!          ▼                   ▼                   ▼
//! ┌─────────────────┐ ┌─────────────────┐ ┌─────────────────┐
//! │     Config      │ │     Client      │ │      Auth       │
//! │                 │ │                 │ │                 │
//! │ • config.toml   │ │ • Posts/replies │ │ • Credentials   │
//! │ • Env overrides │ │ • Users/search  │ │ • Encrypted     │
//! │                 │ │ • Tokens        │ │   file store    │
//! └─────────────────┘ └─────────────────┘ └─────────────────┘
//!                              │
//!          ┌───────────────────┼───────────────────┐
//!          ▼                   ▼                   ▼
//! ┌─────────────────┐ ┌─────────────────┐ ┌─────────────────┐
//! │   Validation    │ │    Transport    │ │   Rate limiter  │
//! │                 │ │                 │ │                 │
//! │ • Before any    │ │ • reqwest       │ │ • Headers       │
//! │   network call  │ │ • Retry/backoff │ │ • 429 backoff   │
//! └─────────────────┘ └─────────────────┘ └─────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`api`] - The [`Client`] and everything it calls
//! - [`auth`] - Stored account credentials
//! - [`cli`] - The `threads` command
//! - [`config`] - CLI settings file
//! - [`error`] - Error taxonomy
//! - [`models`] - Request and response types
//!
//! ## Example
//!
//! ```no_run
//! use threads::{Client, ClientConfig, TokenInfo};
//! use threads::models::TextPostContent;
//!
//! # async fn demo() -> threads::Result<()> {
//! let client = Client::new(ClientConfig::from_env())?;
//! client.set_token_info(TokenInfo::new("long-lived-token", "1234", None));
//!
//! let post = client
//!     .create_text_post(&TextPostContent {
//!         text: "Hello from Rust".into(),
//!         ..Default::default()
//!     })
//!     .await?;
//! println!("{}", post.id);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::return_self_not_must_use)]

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod paths;

pub use api::{CancelToken, Client, ClientConfig, PollConfig, RetryConfig, TokenInfo};
pub use auth::{CredentialStore, Credentials, EncryptedFileStore, MemoryStore};
pub use config::{Config, OutputFormat};
pub use error::{Error, Result};

/// Crate version, sent in the `User-Agent`
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
