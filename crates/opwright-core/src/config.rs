//! Engine configuration
//!
//! [`EngineConfig`] holds the permission policy plus execution settings.
//! [`ConfigStore`] owns the live copy: updates are merged field by field and
//! written to disk before `update` returns, so the next directive the
//! orchestrator runs sees the new policy.

use crate::directive::Domain;
use crate::error::{Error, Result};
use crate::permissions::{PermissionGate, PermissionSet};
use opwright_tools::CommandLimits;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::Duration;
use tracing::{debug, info};

const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 120;
const DEFAULT_MAX_OUTPUT_BYTES: usize = 256 * 1024;

fn default_command_timeout_secs() -> u64 {
    DEFAULT_COMMAND_TIMEOUT_SECS
}

fn default_project_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_max_output_bytes() -> usize {
    DEFAULT_MAX_OUTPUT_BYTES
}

/// Engine settings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Ceiling for one terminal command
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
    /// Project directory all operations run against
    #[serde(default = "default_project_path")]
    pub project_path: PathBuf,
    /// Deployment platform token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_token: Option<String>,
    /// Account name for git push/pull
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_username: Option<String>,
    /// Access token for git push/pull
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_token: Option<String>,
    /// Cap on captured output per command
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,
    /// Per-domain permission flags
    #[serde(default)]
    pub permissions: PermissionSet,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            permissions: PermissionSet::default(),
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
            project_path: default_project_path(),
            deployment_token: None,
            git_username: None,
            git_token: None,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }
}

impl std::fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("EngineConfig")
            .field("permissions", &self.permissions)
            .field("command_timeout_secs", &self.command_timeout_secs)
            .field("project_path", &self.project_path)
            .field("deployment_token", &redact(&self.deployment_token))
            .field("git_username", &self.git_username)
            .field("git_token", &redact(&self.git_token))
            .field("max_output_bytes", &self.max_output_bytes)
            .finish()
    }
}

impl EngineConfig {
    /// Command timeout as a duration
    #[must_use]
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    /// Limits applied to each ephemeral command
    #[must_use]
    pub fn command_limits(&self) -> CommandLimits {
        CommandLimits {
            timeout: self.command_timeout(),
            max_output_bytes: self.max_output_bytes,
        }
    }

    /// Copy with secrets masked, for display
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mask = |v: &Option<String>| v.as_ref().map(|_| "********".to_string());
        Self {
            deployment_token: mask(&self.deployment_token),
            git_token: mask(&self.git_token),
            ..self.clone()
        }
    }

    /// Write as TOML, creating parent folders
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Read a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

/// Partial permission update; `None` leaves a flag unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionUpdate {
    /// Terminal flag
    pub terminal: Option<bool>,
    /// File operations flag
    pub file_operations: Option<bool>,
    /// Build flag
    pub build: Option<bool>,
    /// Deploy flag
    pub deploy: Option<bool>,
    /// Git flag
    pub git: Option<bool>,
}

/// Partial configuration update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigUpdate {
    /// Permission changes
    pub permissions: Option<PermissionUpdate>,
    /// New command timeout
    pub command_timeout_secs: Option<u64>,
    /// New project directory
    pub project_path: Option<PathBuf>,
    /// New deployment token
    pub deployment_token: Option<String>,
    /// New git account name
    pub git_username: Option<String>,
    /// New git access token
    pub git_token: Option<String>,
    /// New output cap
    pub max_output_bytes: Option<usize>,
}

impl ConfigUpdate {
    /// Build an update from a dotted key and a string value
    /// (`permissions.git false`, `command_timeout_secs 300`, ...)
    pub fn from_key_value(key: &str, value: &str) -> Result<Self> {
        let mut update = Self::default();
        match key {
            "command_timeout_secs" => update.command_timeout_secs = Some(parse_number(key, value)?),
            "max_output_bytes" => update.max_output_bytes = Some(parse_number(key, value)?),
            "project_path" => update.project_path = Some(PathBuf::from(value)),
            "deployment_token" => update.deployment_token = Some(value.to_string()),
            "git_username" => update.git_username = Some(value.to_string()),
            "git_token" => update.git_token = Some(value.to_string()),
            _ => {
                let flag = key
                    .strip_prefix("permissions.")
                    .ok_or_else(|| Error::Configuration(format!("unknown key: {}", key)))?;
                let allowed = parse_flag(key, value)?;
                let mut perms = PermissionUpdate::default();
                match flag {
                    "terminal" => perms.terminal = Some(allowed),
                    "file_operations" => perms.file_operations = Some(allowed),
                    "build" => perms.build = Some(allowed),
                    "deploy" => perms.deploy = Some(allowed),
                    "git" => perms.git = Some(allowed),
                    _ => return Err(Error::Configuration(format!("unknown key: {}", key))),
                }
                update.permissions = Some(perms);
            }
        }
        Ok(update)
    }

    fn apply_to(self, config: &mut EngineConfig) {
        if let Some(p) = self.permissions {
            let perms = &mut config.permissions;
            perms.terminal = p.terminal.unwrap_or(perms.terminal);
            perms.file_operations = p.file_operations.unwrap_or(perms.file_operations);
            perms.build = p.build.unwrap_or(perms.build);
            perms.deploy = p.deploy.unwrap_or(perms.deploy);
            perms.git = p.git.unwrap_or(perms.git);
        }
        if let Some(v) = self.command_timeout_secs {
            config.command_timeout_secs = v;
        }
        if let Some(v) = self.project_path {
            config.project_path = v;
        }
        if let Some(v) = self.deployment_token {
            config.deployment_token = Some(v).filter(|t| !t.is_empty());
        }
        if let Some(v) = self.git_username {
            config.git_username = Some(v).filter(|t| !t.is_empty());
        }
        if let Some(v) = self.git_token {
            config.git_token = Some(v).filter(|t| !t.is_empty());
        }
        if let Some(v) = self.max_output_bytes {
            config.max_output_bytes = v;
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Configuration(format!("{} expects a number, got '{}'", key, value)))
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => Err(Error::Configuration(format!(
            "{} expects true or false, got '{}'",
            key, value
        ))),
    }
}

/// Live configuration with optional file persistence.
#[derive(Debug)]
pub struct ConfigStore {
    current: RwLock<EngineConfig>,
    path: Option<PathBuf>,
}

impl ConfigStore {
    /// Store persisted to `path` on every update
    #[must_use]
    pub fn persistent(config: EngineConfig, path: impl Into<PathBuf>) -> Self {
        Self {
            current: RwLock::new(config),
            path: Some(path.into()),
        }
    }

    /// Store that is never written to disk
    #[must_use]
    pub fn in_memory(config: EngineConfig) -> Self {
        Self {
            current: RwLock::new(config),
            path: None,
        }
    }

    /// Backing file, if any
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Copy of the current configuration
    #[must_use]
    pub fn snapshot(&self) -> EngineConfig {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Merge `update` into the configuration and persist it.
    ///
    /// On a write failure the in-memory configuration is left unchanged.
    pub fn update(&self, update: ConfigUpdate) -> Result<EngineConfig> {
        let mut current = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut next = current.clone();
        update.apply_to(&mut next);

        if let Some(path) = &self.path {
            next.save(path)?;
            debug!(path = %path.display(), "Configuration persisted");
        }
        info!(permissions = ?next.permissions, "Configuration updated");
        *current = next.clone();
        Ok(next)
    }
}

impl PermissionGate for ConfigStore {
    fn permissions(&self) -> PermissionSet {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .permissions
    }
}

impl ConfigStore {
    /// Whether `domain` is currently enabled
    #[must_use]
    pub fn is_allowed(&self, domain: Domain) -> bool {
        PermissionGate::is_allowed(self, domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.command_timeout_secs, 120);
        assert_eq!(config.command_timeout(), Duration::from_secs(120));
        assert_eq!(config.max_output_bytes, 256 * 1024);
        assert!(config.deployment_token.is_none());
    }

    #[test]
    fn test_update_merges_only_given_fields() {
        let store = ConfigStore::in_memory(EngineConfig::default());
        let updated = store
            .update(ConfigUpdate {
                permissions: Some(PermissionUpdate {
                    git: Some(false),
                    ..Default::default()
                }),
                command_timeout_secs: Some(30),
                ..Default::default()
            })
            .unwrap();

        assert!(!updated.permissions.git);
        assert!(updated.permissions.terminal);
        assert_eq!(updated.command_timeout_secs, 30);
        assert!(!store.is_allowed(Domain::Git));
        assert!(store.is_allowed(Domain::Terminal));
    }

    #[test]
    fn test_update_persists_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");
        let store = ConfigStore::persistent(EngineConfig::default(), &path);

        store
            .update(ConfigUpdate::from_key_value("permissions.deploy", "true").unwrap())
            .unwrap();

        let reloaded = EngineConfig::load(&path).unwrap();
        assert!(reloaded.permissions.deploy);
        assert_eq!(reloaded, store.snapshot());
    }

    #[test]
    fn test_from_key_value() {
        let update = ConfigUpdate::from_key_value("command_timeout_secs", "300").unwrap();
        assert_eq!(update.command_timeout_secs, Some(300));

        assert!(ConfigUpdate::from_key_value("command_timeout_secs", "soon").is_err());
        assert!(ConfigUpdate::from_key_value("permissions.git", "maybe").is_err());
        assert!(ConfigUpdate::from_key_value("permissions.network", "true").is_err());
        assert!(ConfigUpdate::from_key_value("colour", "blue").is_err());
    }

    #[test]
    fn test_empty_token_clears_value() {
        let mut config = EngineConfig::default();
        config.deployment_token = Some("tok".to_string());
        let store = ConfigStore::in_memory(config);

        let updated = store
            .update(ConfigUpdate::from_key_value("deployment_token", "").unwrap())
            .unwrap();
        assert!(updated.deployment_token.is_none());
    }

    #[test]
    fn test_secrets_hidden() {
        let config = EngineConfig {
            deployment_token: Some("vercel_secret".to_string()),
            git_token: Some("ghp_secret".to_string()),
            ..EngineConfig::default()
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("vercel_secret"));
        assert!(!debug.contains("ghp_secret"));

        let shown = toml::to_string_pretty(&config.redacted()).unwrap();
        assert!(!shown.contains("secret"));
    }
}
