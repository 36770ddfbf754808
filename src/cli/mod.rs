//! `threads` command-line interface

mod account;
mod admin;
pub mod errors;
mod output;
mod posts;
mod read;

use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};

use crate::api::{CancelToken, Client, ClientConfig, TokenInfo};
use crate::auth::{CredentialStore, Credentials, EncryptedFileStore, normalize_account};
use crate::config::{Config, OutputFormat};
use crate::error::Error;

/// Account name used when none is configured
pub const DEFAULT_ACCOUNT: &str = "default";

/// Command-line client for the Threads API
#[derive(Debug, Parser)]
#[command(name = "threads", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Account to act as
    #[arg(short, long, global = true, env = "THREADS_ACCOUNT")]
    pub account: Option<String>,

    /// Output format (text or json)
    #[arg(short, long, global = true)]
    pub output: Option<OutputFormat>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Log in and manage stored accounts
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },
    /// Publish, read and delete posts
    Posts {
        #[command(subcommand)]
        command: PostsCommand,
    },
    /// Read, write and moderate replies
    Replies {
        #[command(subcommand)]
        command: RepliesCommand,
    },
    /// Look up users
    Users {
        #[command(subcommand)]
        command: UsersCommand,
    },
    /// Find locations to tag
    Locations {
        #[command(subcommand)]
        command: LocationsCommand,
    },
    /// Search public posts
    Search(SearchArgs),
    /// Inspect rate limits and publishing quota
    Ratelimit {
        #[command(subcommand)]
        command: RatelimitCommand,
    },
    /// Manage app webhook subscriptions
    Webhooks {
        #[command(subcommand)]
        command: WebhooksCommand,
    },
    /// Read and change CLI settings
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Authorize in the browser and store a long-lived token
    Login {
        /// Scopes to request (comma separated, defaults to the standard set)
        #[arg(long, value_delimiter = ',')]
        scopes: Vec<String>,
        /// Print the URL without opening a browser
        #[arg(long)]
        no_browser: bool,
    },
    /// Store an existing access token
    Token {
        /// Access token
        #[arg(env = "THREADS_ACCESS_TOKEN", hide_env_values = true)]
        token: String,
    },
    /// Refresh the stored long-lived token
    Refresh,
    /// Show the stored token's state
    Status,
    /// List stored accounts
    List,
    /// Forget an account
    Remove {
        /// Account to remove (defaults to the active one)
        name: Option<String>,
    },
}

/// Cursor pagination flags
#[derive(Debug, Clone, Default, Args)]
pub struct PageArgs {
    /// Page size
    #[arg(long)]
    pub limit: Option<u32>,
    /// Cursor of the next page
    #[arg(long)]
    pub after: Option<String>,
    /// Cursor of the previous page
    #[arg(long)]
    pub before: Option<String>,
}

/// Options every kind of post accepts
#[derive(Debug, Clone, Default, Args)]
pub struct PublishArgs {
    /// Topic tag
    #[arg(long)]
    pub topic_tag: Option<String>,
    /// Who may reply (everyone, accounts_you_follow, mentioned_only, ...)
    #[arg(long)]
    pub reply_control: Option<crate::models::ReplyControl>,
    /// Location to tag
    #[arg(long)]
    pub location_id: Option<String>,
    /// Only show the post in these countries (repeatable)
    #[arg(long = "country")]
    pub countries: Vec<String>,
}

#[derive(Debug, Subcommand)]
pub enum PostsCommand {
    /// Publish a text, image or video post
    Create {
        /// Post text
        text: Option<String>,
        /// Image URL
        #[arg(long, conflicts_with = "video")]
        image: Option<String>,
        /// Video URL
        #[arg(long)]
        video: Option<String>,
        /// Alt text for the image or video
        #[arg(long)]
        alt_text: Option<String>,
        /// Blur the image or video behind a spoiler overlay
        #[arg(long)]
        spoiler: bool,
        /// Link preview URL
        #[arg(long)]
        link: Option<String>,
        /// Poll options separated by '|'
        #[arg(long)]
        poll: Option<crate::models::PollAttachment>,
        /// Tenor GIF id
        #[arg(long)]
        gif: Option<String>,
        /// Publish as a ghost post
        #[arg(long)]
        ghost: bool,
        /// Publish in one step
        #[arg(long)]
        auto_publish: bool,
        #[command(flatten)]
        publish: PublishArgs,
    },
    /// Show one post
    Get {
        /// Post id
        id: String,
    },
    /// List a user's posts
    List {
        /// User id (defaults to the authenticated user)
        #[arg(long)]
        user: Option<String>,
        /// Unix seconds lower bound
        #[arg(long)]
        since: Option<i64>,
        /// Unix seconds upper bound
        #[arg(long)]
        until: Option<i64>,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Delete a post
    Delete {
        /// Post id
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Publish a carousel of 2 to 20 images and videos
    Carousel {
        /// Media URLs in order (video detected by extension)
        #[arg(long = "item", required = true)]
        items: Vec<String>,
        /// Caption
        #[arg(long)]
        text: Option<String>,
        /// Alt text per item, in order (repeatable)
        #[arg(long = "alt-text")]
        alt_texts: Vec<String>,
        #[command(flatten)]
        publish: PublishArgs,
    },
    /// Quote another post
    Quote {
        /// Post to quote
        quoted_id: String,
        /// Post text
        text: String,
        #[command(flatten)]
        publish: PublishArgs,
    },
    /// Repost a post
    Repost {
        /// Post id
        id: String,
    },
    /// Undo a repost
    Unrepost {
        /// Post id
        id: String,
    },
    /// List ghost posts
    GhostList {
        /// User id (defaults to the authenticated user)
        #[arg(long)]
        user: Option<String>,
        #[command(flatten)]
        page: PageArgs,
    },
}

#[derive(Debug, Subcommand)]
pub enum RepliesCommand {
    /// Direct replies to a post
    List {
        /// Post id
        post_id: String,
        /// Oldest first
        #[arg(long)]
        reverse: bool,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Reply to a post
    Create {
        /// Post to reply to
        post_id: String,
        /// Reply text
        text: String,
        #[command(flatten)]
        publish: PublishArgs,
    },
    /// Hide a reply
    Hide {
        /// Reply id
        reply_id: String,
    },
    /// Unhide a reply
    Unhide {
        /// Reply id
        reply_id: String,
    },
    /// The whole conversation under a post
    Conversation {
        /// Post id
        post_id: String,
        /// Oldest first
        #[arg(long)]
        reverse: bool,
        #[command(flatten)]
        page: PageArgs,
    },
}

#[derive(Debug, Subcommand)]
pub enum UsersCommand {
    /// The authenticated user
    Me,
    /// A user by id
    Get {
        /// User id
        user_id: String,
        /// Fields to request (comma separated)
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
    },
    /// A public profile by username
    Lookup {
        /// Username, with or without '@'
        username: String,
        /// Also list the profile's posts
        #[arg(long)]
        posts: bool,
    },
    /// Posts mentioning a user
    Mentions {
        /// User id (defaults to the authenticated user)
        #[arg(long)]
        user: Option<String>,
        #[command(flatten)]
        page: PageArgs,
    },
}

#[derive(Debug, Subcommand)]
pub enum LocationsCommand {
    /// Find locations by name or coordinates
    Search {
        /// Place name
        query: Option<String>,
        /// Latitude
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,
        /// Longitude
        #[arg(long, allow_hyphen_values = true)]
        lon: Option<f64>,
    },
    /// A location by id
    Get {
        /// Location id
        id: String,
    },
}

/// Keyword search flags
#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Keyword or topic tag
    pub query: String,
    /// TOP or RECENT
    #[arg(long = "type")]
    pub search_type: Option<crate::models::SearchType>,
    /// KEYWORD or TAG
    #[arg(long)]
    pub mode: Option<crate::models::SearchMode>,
    /// TEXT, IMAGE or VIDEO
    #[arg(long)]
    pub media_type: Option<crate::models::SearchMediaType>,
    /// Only posts by this username
    #[arg(long)]
    pub author: Option<String>,
    /// Unix seconds lower bound
    #[arg(long)]
    pub since: Option<i64>,
    /// Unix seconds upper bound
    #[arg(long)]
    pub until: Option<i64>,
    #[command(flatten)]
    pub page: PageArgs,
}

#[derive(Debug, Subcommand)]
pub enum RatelimitCommand {
    /// Rate limit headroom after one profile request
    Status,
    /// Publishing quota usage
    Publishing,
}

#[derive(Debug, Subcommand)]
pub enum WebhooksCommand {
    /// Subscribe a callback URL
    Subscribe {
        /// Endpoint receiving events
        callback_url: String,
        /// Token echoed during verification
        #[arg(long)]
        verify_token: String,
        /// Fields to subscribe to (comma separated)
        #[arg(long, value_delimiter = ',', default_value = "replies,mentions")]
        fields: Vec<String>,
    },
    /// List subscriptions
    List,
    /// Remove a subscription
    Delete {
        /// Object type
        #[arg(long)]
        object: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the settings file location
    Path,
    /// Show every setting
    List,
    /// Show one setting
    Get {
        /// Setting name
        key: String,
    },
    /// Change a setting
    Set {
        /// Setting name
        key: String,
        /// New value
        value: String,
    },
    /// Reset a setting to its default
    Unset {
        /// Setting name
        key: String,
    },
}

/// Everything a command needs
pub struct Context {
    /// Loaded settings
    pub config: Config,
    /// Where accounts live
    pub store: Box<dyn CredentialStore>,
    /// Effective output format
    pub output: OutputFormat,
    /// Effective account name
    pub account: String,
    /// Fired on Ctrl-C
    pub cancel: CancelToken,
}

impl Context {
    /// Settings from disk, accounts from the encrypted file
    pub fn load(cli: &Cli, cancel: CancelToken) -> Result<Self> {
        let config = Config::load()?;
        let store = EncryptedFileStore::open_default()?;
        Ok(Self::new(cli, config, Box::new(store), cancel))
    }

    /// Context from parts
    pub fn new(
        cli: &Cli,
        config: Config,
        store: Box<dyn CredentialStore>,
        cancel: CancelToken,
    ) -> Self {
        let account = cli
            .account
            .as_deref()
            .or(config.default_account.as_deref())
            .map_or_else(|| DEFAULT_ACCOUNT.to_string(), normalize_account);
        let output = cli.output.unwrap_or(config.output);
        Self {
            config,
            store,
            output,
            account,
            cancel,
        }
    }

    /// Client settings from the environment and the settings file
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::from_env();
        self.config.apply_to(&mut config);
        config
    }

    /// Client without a token
    pub fn anonymous_client(&self) -> Result<Client> {
        let client = Client::new(self.client_config())
            .context("Invalid client settings; set THREADS_CLIENT_ID and THREADS_REDIRECT_URI")?;
        Ok(client.with_cancel(self.cancel.clone()))
    }

    /// Client authenticated as the active account
    pub fn client(&self) -> Result<Client> {
        let client = self.anonymous_client()?;
        let token = match std::env::var("THREADS_ACCESS_TOKEN") {
            Ok(token) if !token.trim().is_empty() => TokenInfo::new(token.trim(), "", None),
            _ => self
                .store
                .get(&self.account)?
                .map(|creds| creds.to_token_info())
                .ok_or_else(|| {
                    Error::not_authenticated(format!("no credentials stored for account '{}'", self.account))
                })?,
        };
        client.set_token_info(token);
        Ok(client)
    }

    /// Store the client's token if it changed (after an implicit refresh)
    pub fn persist_token(&self, client: &Client) -> Result<()> {
        let Some(info) = client.token_info() else {
            return Ok(());
        };
        let Some(stored) = self.store.get(&self.account)? else {
            return Ok(());
        };
        if stored.access_token != info.access_token {
            self.store
                .set(&self.account, &Credentials::from_token_info(&info, stored.username))?;
        }
        Ok(())
    }
}

/// Run one parsed command
pub async fn run(cli: Cli, ctx: &mut Context) -> Result<()> {
    match cli.command {
        Commands::Auth { command } => account::run(command, ctx).await,
        Commands::Posts { command } => posts::run_posts(command, ctx).await,
        Commands::Replies { command } => posts::run_replies(command, ctx).await,
        Commands::Users { command } => read::run_users(command, ctx).await,
        Commands::Locations { command } => read::run_locations(command, ctx).await,
        Commands::Search(args) => read::run_search(args, ctx).await,
        Commands::Ratelimit { command } => admin::run_ratelimit(command, ctx).await,
        Commands::Webhooks { command } => admin::run_webhooks(command, ctx).await,
        Commands::Config { command } => admin::run_config(command, ctx),
    }
}
