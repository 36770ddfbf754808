//! Printing results as text or JSON

use anyhow::Result;
use serde::Serialize;

use crate::config::OutputFormat;
use crate::models::{Location, Page, Post, PublicUser, User};

/// Print `value` as pretty JSON, or run `text` for the human form
pub fn emit<T: Serialize>(format: OutputFormat, value: &T, text: impl FnOnce(&T)) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => text(value),
    }
    Ok(())
}

/// Confirmation line, or `{"success": true, ...}` in JSON mode
pub fn done(format: OutputFormat, message: &str, id: Option<&str>) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({ "success": true, "id": id, "message": message });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Text => println!("✓ {message}"),
    }
    Ok(())
}

/// First line of `text`, cut to `max` characters
fn preview(text: &str, max: usize) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() > max {
        let cut: String = line.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    } else {
        line.to_string()
    }
}

/// Full post
pub fn print_post(post: &Post) {
    let author = post.username.as_deref().unwrap_or("unknown");
    let when = post
        .timestamp
        .map(|t| t.to_string())
        .unwrap_or_default();
    println!("{}  @{author}  {when}", post.id);
    if let Some(text) = post.text.as_deref().filter(|t| !t.is_empty()) {
        println!("{text}");
    }
    if let Some(url) = &post.media_url {
        println!("  media: {url}");
    }
    if let Some(url) = &post.permalink {
        println!("  {url}");
    }
}

/// One line per post, plus the next cursor
pub fn print_posts(page: &Page<Post>) {
    if page.data.is_empty() {
        println!("No posts.");
        return;
    }
    for post in &page.data {
        let author = post.username.as_deref().unwrap_or("unknown");
        let text = post.text.as_deref().map(|t| preview(t, 60)).unwrap_or_default();
        println!("{:<20} @{author:<16} {text}", post.id.as_str());
    }
    print_cursor(page);
}

/// Hint on how to fetch the next page
pub fn print_cursor<T>(page: &Page<T>) {
    if let Some(after) = page.next_cursor() {
        println!("\nMore results: --after {after}");
    }
}

/// User profile
pub fn print_user(user: &User) {
    let verified = if user.is_verified == Some(true) { " ✓" } else { "" };
    println!("@{}{verified}  (id {})", user.username, user.id);
    if let Some(name) = &user.name {
        println!("  {name}");
    }
    if let Some(bio) = user.threads_biography.as_deref().filter(|b| !b.is_empty()) {
        println!("  {bio}");
    }
}

/// Public profile with counters
pub fn print_public_user(user: &PublicUser) {
    let verified = if user.is_verified { " ✓" } else { "" };
    println!("@{}{verified}", user.username);
    if let Some(name) = &user.name {
        println!("  {name}");
    }
    if let Some(bio) = user.biography.as_deref().filter(|b| !b.is_empty()) {
        println!("  {bio}");
    }
    println!(
        "  followers {}  likes {}  replies {}  reposts {}  quotes {}  views {}",
        user.follower_count,
        user.likes_count,
        user.replies_count,
        user.reposts_count,
        user.quotes_count,
        user.views_count
    );
}

/// One location
pub fn print_location(location: &Location) {
    let place: Vec<&str> = [location.city.as_deref(), location.country.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    println!("{:<20} {}  {}", location.id.as_str(), location.name, place.join(", "));
    if let (Some(lat), Some(lon)) = (location.latitude, location.longitude) {
        println!("{:<20} ({lat:.5}, {lon:.5})", "");
    }
}
