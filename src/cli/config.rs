//! CLI configuration management
//!
//! Provides `opwright config {show,set,path}`. Changes are written to the
//! user config file, or to `./opwright.toml` with `--local`.

use super::loader::{load_config, user_config_path, LOCAL_CONFIG_PATH};
use anyhow::{Context, Result};
use clap::Subcommand;
use opwright_core::{ConfigStore, ConfigUpdate, EngineConfig};
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the effective settings (secrets masked)
    Show,
    /// Set a setting value
    Set {
        /// Setting key (`permissions.deploy`, `command_timeout_secs`, ...)
        key: String,
        /// New value
        value: String,
        /// Write to ./opwright.toml instead of the user config file
        #[arg(long)]
        local: bool,
    },
    /// Print the files settings are read from
    Path,
}

pub fn run(cmd: ConfigCommands) -> Result<()> {
    match cmd {
        ConfigCommands::Show => cmd_show(),
        ConfigCommands::Set { key, value, local } => cmd_set(&key, &value, local),
        ConfigCommands::Path => cmd_path(),
    }
}

// ── show ──

fn cmd_show() -> Result<()> {
    let config = load_config().context("Failed to load configuration")?;
    let text = toml::to_string_pretty(&config.redacted()).context("Failed to render configuration")?;
    print!("{}", text);
    Ok(())
}

// ── set ──

fn target_path(local: bool) -> Result<PathBuf> {
    if local {
        return Ok(PathBuf::from(LOCAL_CONFIG_PATH));
    }
    user_config_path().context("No user config directory on this system; use --local")
}

fn cmd_set(key: &str, value: &str, local: bool) -> Result<()> {
    let path = target_path(local)?;

    // Only the target file is rewritten, never the merged layers, so values
    // from the environment are not copied to disk.
    let base = if path.exists() {
        EngineConfig::load(&path).with_context(|| format!("Failed to read {}", path.display()))?
    } else {
        EngineConfig::default()
    };

    let update = ConfigUpdate::from_key_value(key, value)?;
    let store = ConfigStore::persistent(base, &path);
    store
        .update(update)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("{} updated in {}", key, path.display());
    Ok(())
}

// ── path ──

fn cmd_path() -> Result<()> {
    println!("embedded defaults");
    match user_config_path() {
        Some(path) => {
            let marker = if path.exists() { "" } else { " (not found)" };
            println!("{}{}", path.display(), marker);
        }
        None => println!("(no user config directory)"),
    }
    let local = PathBuf::from(LOCAL_CONFIG_PATH);
    let marker = if local.exists() { "" } else { " (not found)" };
    println!("{}{}", local.display(), marker);
    println!("OPWRIGHT_* environment variables");
    Ok(())
}
