use crate::error::Result;
use crate::file::ProjectFile;
use serde::{Deserialize, Serialize};

/// A file uploaded as part of a deployment
pub type DeployFile = ProjectFile;

/// Per-deployment settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployOptions {
    /// Target platform (`vercel`)
    pub platform: String,
    /// Environment variables, in declaration order
    pub env: Vec<(String, String)>,
}

impl DeployOptions {
    /// Options for `platform` with no environment
    #[must_use]
    pub fn new(platform: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            env: Vec::new(),
        }
    }

    /// Add an environment variable
    #[must_use]
    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((name.into(), value.into()));
        self
    }
}

/// What the platform reported for a created deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployOutcome {
    /// Public URL
    pub url: Option<String>,
    /// Platform deployment id
    pub id: String,
    /// Platform state (`QUEUED`, `BUILDING`, `READY`, ...)
    pub state: Option<String>,
}

/// Hosting platform client.
#[async_trait::async_trait]
pub trait DeployBackend: Send + Sync {
    /// Create a deployment of `files` under `project_name`
    async fn deploy(
        &self,
        files: Vec<DeployFile>,
        project_name: &str,
        token: &str,
        opts: &DeployOptions,
    ) -> Result<DeployOutcome>;
}
