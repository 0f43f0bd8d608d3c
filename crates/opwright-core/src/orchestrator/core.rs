//! Orchestrator core structure

use crate::config::ConfigStore;
use crate::reporter::Reporter;
use opwright_tools::{DeployBackend, FileStore, GitBackend, SessionManager, TerminalRunner};
use std::fmt;
use std::sync::Arc;

/// The side-effecting collaborators directives are executed against.
#[derive(Clone)]
pub struct Collaborators {
    /// Terminal host
    pub terminal: Arc<dyn TerminalRunner>,
    /// Project file store
    pub files: Arc<dyn FileStore>,
    /// Version control
    pub git: Arc<dyn GitBackend>,
    /// Deployment platform
    pub deploy: Arc<dyn DeployBackend>,
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

/// Executes operation batches against the collaborators.
pub struct Orchestrator {
    pub(crate) store: Arc<ConfigStore>,
    pub(crate) sessions: Arc<SessionManager>,
    pub(crate) files: Arc<dyn FileStore>,
    pub(crate) git: Arc<dyn GitBackend>,
    pub(crate) deploy: Arc<dyn DeployBackend>,
    pub(crate) reporter: Reporter,
}

impl Orchestrator {
    /// Create an orchestrator.
    ///
    /// Permissions and settings are read from `store` for every directive,
    /// so updates apply to the next directive executed.
    #[must_use]
    pub fn new(
        store: Arc<ConfigStore>,
        sessions: Arc<SessionManager>,
        collaborators: &Collaborators,
        reporter: Reporter,
    ) -> Self {
        Self {
            store,
            sessions,
            files: collaborators.files.clone(),
            git: collaborators.git.clone(),
            deploy: collaborators.deploy.clone(),
            reporter,
        }
    }

    /// Reporter receiving results
    #[must_use]
    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    /// Session manager used for terminal and build directives
    #[must_use]
    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Configuration store
    #[must_use]
    pub fn config(&self) -> &Arc<ConfigStore> {
        &self.store
    }
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("store", &self.store)
            .field("reporter", &self.reporter)
            .finish_non_exhaustive()
    }
}
