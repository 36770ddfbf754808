//! `threads ratelimit ...`, `threads webhooks ...` and `threads config ...`

use anyhow::Result;
use serde::Serialize;

use super::output::{done, emit};
use super::{ConfigCommand, Context, RatelimitCommand, WebhooksCommand};
use crate::config::Config;

pub async fn run_ratelimit(command: RatelimitCommand, ctx: &mut Context) -> Result<()> {
    let client = ctx.client()?;
    let result = match command {
        RatelimitCommand::Status => {
            // Headers of a cheap call populate the limiter
            client.get_me().await.map(|_| client.rate_limiter().status())
        }
        RatelimitCommand::Publishing => {
            let limits = client.get_publishing_limits().await;
            ctx.persist_token(&client)?;
            return emit(ctx.output, &limits?, |l| {
                println!(
                    "Posts:   {}/{} per {}h",
                    l.quota_usage,
                    l.config.quota_total,
                    l.config.quota_duration / 3600
                );
                println!(
                    "Replies: {}/{} per {}h",
                    l.reply_quota_usage,
                    l.reply_config.quota_total,
                    l.reply_config.quota_duration / 3600
                );
            });
        }
    };
    ctx.persist_token(&client)?;
    emit(ctx.output, &result?, |s| {
        println!("Calls remaining: {}/{}", s.remaining, s.limit);
        println!("Platform usage:  {:.0}%", s.usage_percent);
        if let Some(secs) = s.reset_in_secs {
            println!("Window resets:   in {secs}s");
        }
        if s.throttled {
            println!("\n✗ Throttled. Wait before sending more requests.");
        } else if s.near_limit {
            println!("\n! Near the limit. Requests will be delayed.");
        }
    })
}

pub async fn run_webhooks(command: WebhooksCommand, ctx: &mut Context) -> Result<()> {
    let client = ctx.anonymous_client()?;
    match command {
        WebhooksCommand::Subscribe {
            callback_url,
            verify_token,
            fields,
        } => {
            client
                .subscribe_webhook(&callback_url, &verify_token, &fields)
                .await?;
            done(ctx.output, &format!("Subscribed {callback_url}"), None)
        }
        WebhooksCommand::List => {
            let subscriptions = client.list_webhook_subscriptions().await?;
            emit(ctx.output, &subscriptions, |subs| {
                if subs.data.is_empty() {
                    println!("No webhook subscriptions.");
                }
                for sub in &subs.data {
                    let fields: Vec<&str> = sub.fields.iter().map(|f| f.name.as_str()).collect();
                    let state = if sub.active { "active" } else { "inactive" };
                    println!("{} {} ({state}): {}", sub.object, sub.callback_url, fields.join(", "));
                }
            })
        }
        WebhooksCommand::Delete { object } => {
            client.delete_webhook_subscription(object.as_deref()).await?;
            done(ctx.output, "Deleted webhook subscription", None)
        }
    }
}

#[derive(Debug, Serialize)]
struct Setting {
    key: &'static str,
    value: Option<String>,
}

pub fn run_config(command: ConfigCommand, ctx: &mut Context) -> Result<()> {
    match command {
        ConfigCommand::Path => {
            let path = Config::default_path()?;
            emit(ctx.output, &path, |p| println!("{}", p.display()))
        }
        ConfigCommand::List => {
            let settings: Vec<Setting> = ctx
                .config
                .list()
                .into_iter()
                .map(|(key, value)| Setting { key, value })
                .collect();
            emit(ctx.output, &settings, |settings| {
                for s in settings {
                    println!("{:<20} {}", s.key, s.value.as_deref().unwrap_or("(unset)"));
                }
            })
        }
        ConfigCommand::Get { key } => {
            let value = ctx.config.get(&key)?;
            emit(ctx.output, &value, |v| {
                println!("{}", v.as_deref().unwrap_or("(unset)"));
            })
        }
        ConfigCommand::Set { key, value } => {
            ctx.config.set(&key, &value)?;
            ctx.config.save()?;
            done(ctx.output, &format!("Set {key}"), None)
        }
        ConfigCommand::Unset { key } => {
            ctx.config.unset(&key)?;
            ctx.config.save()?;
            done(ctx.output, &format!("Reset {key} to its default"), None)
        }
    }
}
