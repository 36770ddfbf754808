//! `threads users ...`, `threads locations ...` and `threads search`

use anyhow::Result;
use serde::Serialize;

use super::output::{emit, print_location, print_posts, print_public_user, print_user};
use super::{Context, LocationsCommand, SearchArgs, UsersCommand};
use crate::api::Client;
use crate::models::{LocationId, PostsResponse, PublicUser, SearchOptions, UserId};

#[derive(Debug, Serialize)]
struct ProfileView {
    profile: PublicUser,
    #[serde(skip_serializing_if = "Option::is_none")]
    posts: Option<PostsResponse>,
}

pub async fn run_users(command: UsersCommand, ctx: &mut Context) -> Result<()> {
    let client = ctx.client()?;
    let result = users(command, ctx, &client).await;
    ctx.persist_token(&client)?;
    result
}

async fn users(command: UsersCommand, ctx: &Context, client: &Client) -> Result<()> {
    match command {
        UsersCommand::Me => {
            let me = client.get_me().await?;
            emit(ctx.output, &me, print_user)
        }
        UsersCommand::Get { user_id, fields } => {
            let fields: Vec<&str> = fields.iter().map(String::as_str).collect();
            let user = client
                .get_user_fields(&UserId::new(user_id), &fields)
                .await?;
            emit(ctx.output, &user, print_user)
        }
        UsersCommand::Lookup { username, posts } => {
            let profile = client.lookup_public_profile(&username).await?;
            let posts = if posts {
                Some(client.get_public_profile_posts(&username, None).await?)
            } else {
                None
            };
            emit(ctx.output, &ProfileView { profile, posts }, |view| {
                print_public_user(&view.profile);
                if let Some(posts) = &view.posts {
                    println!();
                    print_posts(posts);
                }
            })
        }
        UsersCommand::Mentions { user, page } => {
            let user = UserId::new(user.unwrap_or_else(|| client.me()));
            let mentions = client
                .get_user_mentions(&user, page.to_options().as_ref())
                .await?;
            emit(ctx.output, &mentions, print_posts)
        }
    }
}

pub async fn run_locations(command: LocationsCommand, ctx: &mut Context) -> Result<()> {
    let client = ctx.client()?;
    let result = locations(command, ctx, &client).await;
    ctx.persist_token(&client)?;
    result
}

async fn locations(command: LocationsCommand, ctx: &Context, client: &Client) -> Result<()> {
    match command {
        LocationsCommand::Search { query, lat, lon } => {
            let found = client.search_locations(query.as_deref(), lat, lon).await?;
            emit(ctx.output, &found, |found| {
                if found.data.is_empty() {
                    println!("No locations found.");
                }
                found.data.iter().for_each(print_location);
            })
        }
        LocationsCommand::Get { id } => {
            let location = client.get_location(&LocationId::new(id)).await?;
            emit(ctx.output, &location, print_location)
        }
    }
}

pub async fn run_search(args: SearchArgs, ctx: &mut Context) -> Result<()> {
    let client = ctx.client()?;
    let opts = SearchOptions {
        search_type: args.search_type,
        search_mode: args.mode,
        media_type: args.media_type,
        author_username: args.author,
        pagination: args.page.to_options().unwrap_or_default(),
        since: args.since,
        until: args.until,
    };
    let result = client.keyword_search(&args.query, Some(&opts)).await;
    ctx.persist_token(&client)?;
    emit(ctx.output, &result?, print_posts)
}
