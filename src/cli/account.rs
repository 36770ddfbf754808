//! `threads auth ...`

use std::io::{self, BufRead, Write};

use anyhow::{Context as _, Result, bail};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use super::output::{done, emit};
use super::{AuthCommand, Context};
use crate::api::{Client, TokenInfo};
use crate::auth::{Credentials, normalize_account};
use crate::error::Error;

pub async fn run(command: AuthCommand, ctx: &mut Context) -> Result<()> {
    match command {
        AuthCommand::Login { scopes, no_browser } => login(ctx, &scopes, no_browser).await,
        AuthCommand::Token { token } => store_token(ctx, &token).await,
        AuthCommand::Refresh => refresh(ctx).await,
        AuthCommand::Status => status(ctx),
        AuthCommand::List => list(ctx),
        AuthCommand::Remove { name } => remove(ctx, name.as_deref()),
    }
}

/// Authorization code from either the bare code or the full redirect URL
fn parse_authorization_input(input: &str, expected_state: &str) -> Result<String> {
    let input = input.trim();
    if input.is_empty() {
        bail!("No authorization code entered");
    }
    if !input.starts_with("http://") && !input.starts_with("https://") {
        return Ok(input.trim_end_matches("#_").to_string());
    }

    let url = reqwest::Url::parse(input).context("Could not parse the redirect URL")?;
    let mut code = None;
    let mut state = None;
    let mut error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error_description" => error = Some(value.into_owned()),
            "error" if error.is_none() => error = Some(value.into_owned()),
            _ => {}
        }
    }
    if let Some(error) = error {
        bail!("Authorization was denied: {error}");
    }
    if state.as_deref().is_some_and(|s| s != expected_state) {
        bail!("State mismatch in redirect URL; start the login again");
    }
    code.map(|c| c.trim_end_matches("#_").to_string())
        .filter(|c| !c.is_empty())
        .context("Redirect URL has no `code` parameter")
}

fn save_account(ctx: &mut Context, client: &Client, username: &str) -> Result<()> {
    let info = client
        .token_info()
        .context("No token was installed after authentication")?;
    ctx.store
        .set(&ctx.account, &Credentials::from_token_info(&info, username))?;
    if ctx.config.default_account.is_none() {
        ctx.config.default_account = Some(ctx.account.clone());
        ctx.config.save()?;
    }
    Ok(())
}

async fn login(ctx: &mut Context, scopes: &[String], no_browser: bool) -> Result<()> {
    let client = ctx.anonymous_client()?;
    let request = client.authorization_request(scopes);

    println!("Open this URL in your browser:\n\n  {}\n", request.url);
    if !no_browser && let Err(err) = open::that(&request.url) {
        debug!(error = %err, "Could not open browser");
    }

    print!("Paste the redirect URL or the authorization code: ");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    let code = parse_authorization_input(&input, &request.state)?;

    client.exchange_code_for_token(&code).await?;
    println!("✓ Authorization code accepted");
    let long_lived = client.get_long_lived_token().await?;
    let me = client.get_me().await?;
    save_account(ctx, &client, &me.username)?;

    println!(
        "✓ Logged in as @{} (account '{}', token valid for {} days)",
        me.username,
        ctx.account,
        long_lived.expires_in / 86_400
    );
    Ok(())
}

async fn store_token(ctx: &mut Context, token: &str) -> Result<()> {
    let token = token.trim();
    if token.is_empty() {
        return Err(Error::validation("token", "access token must not be empty").into());
    }
    let client = ctx.anonymous_client()?;
    client.set_token_info(TokenInfo::new(token, "", None));
    let debug = client.debug_token(None).await?;
    client.set_token_from_debug_info(token, Some(&debug))?;
    let me = client.get_me().await?;
    save_account(ctx, &client, &me.username)?;
    done(
        ctx.output,
        &format!("Stored token for @{} as account '{}'", me.username, ctx.account),
        Some(me.id.as_str()),
    )
}

async fn refresh(ctx: &mut Context) -> Result<()> {
    let stored = ctx.store.get(&ctx.account)?.ok_or_else(|| {
        Error::not_authenticated(format!("no credentials stored for account '{}'", ctx.account))
    })?;
    let client = ctx.anonymous_client()?;
    client.set_token_info(stored.to_token_info());
    let response = client.refresh_token().await?;
    save_account(ctx, &client, &stored.username)?;
    done(
        ctx.output,
        &format!(
            "Refreshed token for account '{}' (valid for {} days)",
            ctx.account,
            response.expires_in / 86_400
        ),
        None,
    )
}

#[derive(Debug, Serialize)]
struct StatusView {
    account: String,
    username: String,
    user_id: String,
    created_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    days_until_expiry: Option<i64>,
    expired: bool,
    rotation_due: bool,
}

fn status(ctx: &Context) -> Result<()> {
    let creds = ctx.store.get(&ctx.account)?.ok_or_else(|| {
        Error::not_authenticated(format!("no credentials stored for account '{}'", ctx.account))
    })?;
    let view = StatusView {
        account: ctx.account.clone(),
        username: creds.username.clone(),
        user_id: creds.user_id.clone(),
        created_at: creds.created_at,
        expires_at: creds.expires_at,
        days_until_expiry: creds.expires_at.map(|_| creds.days_until_expiry()),
        expired: creds.is_expired(),
        rotation_due: creds.rotation_due(),
    };
    emit(ctx.output, &view, |v| {
        println!("Account:  {} (@{}, id {})", v.account, v.username, v.user_id);
        println!("Issued:   {}", v.created_at.format("%Y-%m-%d %H:%M UTC"));
        match (v.expires_at, v.days_until_expiry) {
            (Some(at), Some(days)) => {
                println!("Expires:  {} ({days} days)", at.format("%Y-%m-%d %H:%M UTC"));
            }
            _ => println!("Expires:  unknown"),
        }
        if v.expired {
            println!("\n✗ Token expired. Run `threads auth login`.");
        } else if v.rotation_due {
            println!("\n! Token is due for rotation. Run `threads auth refresh`.");
        } else {
            println!("\n✓ Token is valid");
        }
    })
}

#[derive(Debug, Serialize)]
struct AccountView {
    name: String,
    username: String,
    user_id: String,
    active: bool,
}

fn list(ctx: &Context) -> Result<()> {
    let mut accounts = Vec::new();
    for name in ctx.store.list()? {
        let Some(creds) = ctx.store.get(&name)? else {
            continue;
        };
        accounts.push(AccountView {
            active: name == ctx.account,
            name,
            username: creds.username,
            user_id: creds.user_id,
        });
    }
    emit(ctx.output, &accounts, |accounts| {
        if accounts.is_empty() {
            println!("No accounts configured.");
            println!("\nAdd one with:\n  threads auth login");
            return;
        }
        println!("Configured accounts:\n");
        for account in accounts {
            let marker = if account.active { " (active)" } else { "" };
            println!("  {} @{}{marker}", account.name, account.username);
        }
    })
}

fn remove(ctx: &mut Context, name: Option<&str>) -> Result<()> {
    let name = name.map_or_else(|| ctx.account.clone(), normalize_account);
    if ctx.store.get(&name)?.is_none() {
        bail!("No account named '{name}'");
    }
    ctx.store.delete(&name)?;
    if ctx.config.default_account.as_deref() == Some(name.as_str()) {
        ctx.config.default_account = None;
        ctx.config.save()?;
    }
    done(ctx.output, &format!("Removed account '{name}'"), None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_code() {
        assert_eq!(parse_authorization_input(" abc123#_\n", "s").unwrap(), "abc123");
        assert!(parse_authorization_input("   ", "s").is_err());
    }

    #[test]
    fn test_redirect_url() {
        let url = "https://example.com/callback?code=xyz#_&state=s1";
        // Fragment swallows the state; the code is still usable
        assert_eq!(parse_authorization_input(url, "s1").unwrap(), "xyz");

        let url = "https://example.com/callback?code=xyz&state=s1";
        assert_eq!(parse_authorization_input(url, "s1").unwrap(), "xyz");
    }

    #[test]
    fn test_redirect_url_rejections() {
        let mismatch = "https://example.com/callback?code=xyz&state=other";
        assert!(parse_authorization_input(mismatch, "s1").is_err());

        let denied = "https://example.com/callback?error=access_denied&error_description=User+denied";
        let err = parse_authorization_input(denied, "s1").unwrap_err();
        assert!(err.to_string().contains("User denied"));

        let missing = "https://example.com/callback?state=s1";
        assert!(parse_authorization_input(missing, "s1").is_err());
    }
}
