//! `threads posts ...` and `threads replies ...`

use std::io::{self, BufRead, Write};

use anyhow::Result;

use super::output::{done, emit, print_post, print_posts};
use super::{Context, PageArgs, PostsCommand, PublishArgs, RepliesCommand};
use crate::api::Client;
use crate::models::{
    CarouselItem, CarouselPostContent, CommonOptions, GifAttachment, ImagePostContent,
    PaginationOptions, Post, PostContent, PostId, PostsOptions, RepliesOptions, TextPostContent,
    UserId, VideoPostContent,
};

const VIDEO_EXTENSIONS: [&str; 5] = [".mp4", ".mov", ".m4v", ".webm", ".avi"];

impl PageArgs {
    pub(crate) fn to_options(&self) -> Option<PaginationOptions> {
        let opts = PaginationOptions {
            limit: self.limit,
            before: self.before.clone(),
            after: self.after.clone(),
        };
        (opts != PaginationOptions::default()).then_some(opts)
    }
}

impl PublishArgs {
    fn to_options(&self) -> CommonOptions {
        CommonOptions {
            reply_control: self.reply_control,
            topic_tag: self.topic_tag.clone(),
            location_id: self.location_id.clone(),
            allowlisted_country_codes: self.countries.clone(),
            ..CommonOptions::default()
        }
    }
}

/// Carousel item, typed by the URL's file extension
fn carousel_item(url: &str) -> CarouselItem {
    let path = url.split(['?', '#']).next().unwrap_or_default().to_ascii_lowercase();
    if VIDEO_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        CarouselItem::video(url)
    } else {
        CarouselItem::image(url)
    }
}

/// Ask on stderr, accept y/yes
fn confirm_delete(post: &Post) -> bool {
    let text = post.text.as_deref().unwrap_or_default();
    eprint!("Delete post {} \"{text}\"? [y/N] ", post.id);
    if io::stderr().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn user_or_me(client: &Client, user: Option<String>) -> UserId {
    UserId::new(user.unwrap_or_else(|| client.me()))
}

struct CreateArgs {
    text: Option<String>,
    image: Option<String>,
    video: Option<String>,
    alt_text: Option<String>,
    spoiler: bool,
    link: Option<String>,
    poll: Option<crate::models::PollAttachment>,
    gif: Option<String>,
    ghost: bool,
    auto_publish: bool,
    publish: PublishArgs,
}

fn build_content(args: CreateArgs) -> PostContent {
    let options = args.publish.to_options();
    let text = args.text.unwrap_or_default();
    if let Some(image_url) = args.image {
        return ImagePostContent {
            text,
            image_url,
            alt_text: args.alt_text,
            is_spoiler_media: args.spoiler,
            options,
        }
        .into();
    }
    if let Some(video_url) = args.video {
        return VideoPostContent {
            text,
            video_url,
            alt_text: args.alt_text,
            is_spoiler_media: args.spoiler,
            options,
        }
        .into();
    }
    TextPostContent {
        text,
        link_attachment: args.link,
        poll_attachment: args.poll,
        gif_attachment: args.gif.map(GifAttachment::tenor),
        auto_publish_text: args.auto_publish,
        is_ghost_post: args.ghost,
        options,
        ..TextPostContent::default()
    }
    .into()
}

fn show_published(ctx: &Context, post: &Post) -> Result<()> {
    emit(ctx.output, post, |post| {
        println!("✓ Published {}", post.id);
        if let Some(url) = &post.permalink {
            println!("  {url}");
        }
    })
}

pub async fn run_posts(command: PostsCommand, ctx: &mut Context) -> Result<()> {
    let client = ctx.client()?;
    let result = posts(command, ctx, &client).await;
    ctx.persist_token(&client)?;
    result
}

async fn posts(command: PostsCommand, ctx: &Context, client: &Client) -> Result<()> {
    match command {
        PostsCommand::Create {
            text,
            image,
            video,
            alt_text,
            spoiler,
            link,
            poll,
            gif,
            ghost,
            auto_publish,
            publish,
        } => {
            let content = build_content(CreateArgs {
                text,
                image,
                video,
                alt_text,
                spoiler,
                link,
                poll,
                gif,
                ghost,
                auto_publish,
                publish,
            });
            let post = client.create_post(&content).await?;
            show_published(ctx, &post)
        }
        PostsCommand::Get { id } => {
            let post = client.get_post(&PostId::new(id)).await?;
            emit(ctx.output, &post, print_post)
        }
        PostsCommand::List {
            user,
            since,
            until,
            page,
        } => {
            let user = user_or_me(client, user);
            let opts = PostsOptions {
                pagination: page.to_options().unwrap_or_default(),
                since,
                until,
            };
            let posts = client.get_user_posts_with_options(&user, &opts).await?;
            emit(ctx.output, &posts, print_posts)
        }
        PostsCommand::Delete { id, yes } => {
            let id = PostId::new(id);
            if yes {
                client.delete_post(&id).await?;
            } else if !client
                .delete_post_with_confirmation(&id, Some(confirm_delete))
                .await?
            {
                println!("Cancelled.");
                return Ok(());
            }
            done(ctx.output, &format!("Deleted post {id}"), Some(id.as_str()))
        }
        PostsCommand::Carousel {
            items,
            text,
            alt_texts,
            publish,
        } => {
            let content = CarouselPostContent {
                text: text.unwrap_or_default(),
                items: items.iter().map(|url| carousel_item(url)).collect(),
                alt_texts,
                options: publish.to_options(),
            };
            let post = client.create_carousel_post(&content).await?;
            show_published(ctx, &post)
        }
        PostsCommand::Quote {
            quoted_id,
            text,
            publish,
        } => {
            let content = TextPostContent {
                text,
                options: publish.to_options(),
                ..TextPostContent::default()
            };
            let post = client
                .create_quote_post(content, &PostId::new(quoted_id))
                .await?;
            show_published(ctx, &post)
        }
        PostsCommand::Repost { id } => {
            let repost = client.repost_post(&PostId::new(id)).await?;
            emit(ctx.output, &repost, |r| println!("✓ Reposted as {}", r.id))
        }
        PostsCommand::Unrepost { id } => {
            client.unrepost_post(&PostId::new(&id)).await?;
            done(ctx.output, &format!("Removed repost of {id}"), Some(id.as_str()))
        }
        PostsCommand::GhostList { user, page } => {
            let user = user_or_me(client, user);
            let posts = client
                .get_user_ghost_posts(&user, page.to_options().as_ref())
                .await?;
            emit(ctx.output, &posts, print_posts)
        }
    }
}

pub async fn run_replies(command: RepliesCommand, ctx: &mut Context) -> Result<()> {
    let client = ctx.client()?;
    let result = replies(command, ctx, &client).await;
    ctx.persist_token(&client)?;
    result
}

fn replies_options(page: &PageArgs, reverse: bool) -> RepliesOptions {
    RepliesOptions {
        pagination: page.to_options().unwrap_or_default(),
        reverse: reverse.then_some(true),
    }
}

async fn replies(command: RepliesCommand, ctx: &Context, client: &Client) -> Result<()> {
    match command {
        RepliesCommand::List {
            post_id,
            reverse,
            page,
        } => {
            let opts = replies_options(&page, reverse);
            let replies = client.get_replies(&PostId::new(post_id), Some(&opts)).await?;
            emit(ctx.output, &replies, print_posts)
        }
        RepliesCommand::Conversation {
            post_id,
            reverse,
            page,
        } => {
            let opts = replies_options(&page, reverse);
            let replies = client
                .get_conversation(&PostId::new(post_id), Some(&opts))
                .await?;
            emit(ctx.output, &replies, print_posts)
        }
        RepliesCommand::Create {
            post_id,
            text,
            publish,
        } => {
            let content = TextPostContent {
                text,
                options: publish.to_options(),
                ..TextPostContent::default()
            };
            let reply = client.create_reply(&PostId::new(post_id), content).await?;
            show_published(ctx, &reply)
        }
        RepliesCommand::Hide { reply_id } => {
            client.hide_reply(&PostId::new(&reply_id)).await?;
            done(ctx.output, &format!("Hid reply {reply_id}"), Some(reply_id.as_str()))
        }
        RepliesCommand::Unhide { reply_id } => {
            client.unhide_reply(&PostId::new(&reply_id)).await?;
            done(ctx.output, &format!("Unhid reply {reply_id}"), Some(reply_id.as_str()))
        }
    }
}
