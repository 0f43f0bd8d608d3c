//! Permissions - per-domain execution policy
//!
//! Each of the five domains is either enabled or disabled. A directive in a
//! disabled domain is never handed to its collaborator; the orchestrator
//! records a synthesized failure instead.

use crate::directive::Domain;
use serde::{Deserialize, Serialize};

/// Per-domain permission flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionSet {
    /// Terminal commands and named processes
    pub terminal: bool,
    /// File and folder operations
    pub file_operations: bool,
    /// Build, test, run and dev server
    pub build: bool,
    /// Deployment
    pub deploy: bool,
    /// Version control
    pub git: bool,
}

impl Default for PermissionSet {
    fn default() -> Self {
        Self {
            terminal: true,
            file_operations: true,
            build: true,
            deploy: false,
            git: true,
        }
    }
}

impl PermissionSet {
    /// Everything enabled
    #[must_use]
    pub fn all() -> Self {
        Self {
            terminal: true,
            file_operations: true,
            build: true,
            deploy: true,
            git: true,
        }
    }

    /// Everything disabled
    #[must_use]
    pub fn none() -> Self {
        Self {
            terminal: false,
            file_operations: false,
            build: false,
            deploy: false,
            git: false,
        }
    }

    /// Whether `domain` may run
    #[must_use]
    pub fn is_allowed(&self, domain: Domain) -> bool {
        match domain {
            Domain::Terminal => self.terminal,
            Domain::File => self.file_operations,
            Domain::Build => self.build,
            Domain::Deploy => self.deploy,
            Domain::Git => self.git,
        }
    }

    /// Copy with `domain` set to `allowed`
    #[must_use]
    pub fn with(mut self, domain: Domain, allowed: bool) -> Self {
        match domain {
            Domain::Terminal => self.terminal = allowed,
            Domain::File => self.file_operations = allowed,
            Domain::Build => self.build = allowed,
            Domain::Deploy => self.deploy = allowed,
            Domain::Git => self.git = allowed,
        }
        self
    }
}

/// Source of the permission policy consulted before each directive.
pub trait PermissionGate: Send + Sync {
    /// Current permission flags
    fn permissions(&self) -> PermissionSet;

    /// Whether `domain` may run right now
    fn is_allowed(&self, domain: Domain) -> bool {
        self.permissions().is_allowed(domain)
    }
}

impl PermissionGate for PermissionSet {
    fn permissions(&self) -> PermissionSet {
        *self
    }
}

/// Message recorded for directives in a disabled domain
#[must_use]
pub fn disabled_message(domain: Domain) -> String {
    format!("{} operations disabled", domain.label())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_permissions() {
        let perms = PermissionSet::default();
        assert!(perms.is_allowed(Domain::Terminal));
        assert!(perms.is_allowed(Domain::File));
        assert!(perms.is_allowed(Domain::Git));
        assert!(!perms.is_allowed(Domain::Deploy));
    }

    #[test]
    fn test_with_toggles_one_domain() {
        let perms = PermissionSet::all().with(Domain::Git, false);
        assert!(!perms.is_allowed(Domain::Git));
        assert!(perms.is_allowed(Domain::Build));
        assert!(PermissionSet::none().with(Domain::Build, true).is_allowed(Domain::Build));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let perms: PermissionSet = toml::from_str("terminal = false").unwrap();
        assert!(!perms.terminal);
        assert!(perms.file_operations);
        assert!(!perms.deploy);
    }

    #[test]
    fn test_disabled_message() {
        assert_eq!(disabled_message(Domain::Terminal), "Terminal operations disabled");
    }
}
