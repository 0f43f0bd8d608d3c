//! Configuration loading
//!
//! Layers, lowest priority first: embedded defaults, the user config file,
//! `./opwright.toml`, then `OPWRIGHT_*` environment variables.

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use opwright_core::EngineConfig;
use std::path::PathBuf;

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../../config/default.toml");

/// Project-local override file
pub const LOCAL_CONFIG_PATH: &str = "opwright.toml";

/// `<config_dir>/opwright/config.toml`
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("opwright").join("config.toml"))
}

/// Load configuration from files and environment
pub fn load_config() -> Result<EngineConfig> {
    let mut builder = Config::builder()
        // 1. Embedded defaults (always available)
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

    // 2. User and project files (optional)
    if let Some(path) = user_config_path() {
        builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
    }
    builder = builder.add_source(
        File::with_name(LOCAL_CONFIG_PATH)
            .format(FileFormat::Toml)
            .required(false),
    );

    // 3. Environment variables (highest priority), e.g. OPWRIGHT_PERMISSIONS__DEPLOY
    let config = builder
        .add_source(
            Environment::with_prefix("OPWRIGHT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    config
        .try_deserialize()
        .context("Failed to deserialize configuration")
}
