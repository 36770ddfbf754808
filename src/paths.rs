//! Where the CLI keeps its files
//!
//! Everything lives under `~/.config/threads-cli/` unless
//! `THREADS_CONFIG_DIR` points elsewhere:
//! - config.toml - CLI settings
//! - credentials.enc - Encrypted account credentials

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// Environment variable overriding the data directory
pub const CONFIG_DIR_ENV: &str = "THREADS_CONFIG_DIR";

/// Data directory, created on first use
pub fn threads_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os(CONFIG_DIR_ENV).filter(|v| !v.is_empty()) {
        Some(dir) => PathBuf::from(dir),
        None => dirs::home_dir()
            .context("Could not determine home directory")?
            .join(".config")
            .join("threads-cli"),
    };
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    Ok(dir)
}

/// `config.toml` inside [`threads_dir`]
pub fn config_path() -> Result<PathBuf> {
    Ok(threads_dir()?.join("config.toml"))
}

/// `credentials.enc` inside [`threads_dir`]
pub fn credentials_path() -> Result<PathBuf> {
    Ok(threads_dir()?.join("credentials.enc"))
}
