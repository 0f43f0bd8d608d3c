//! Deployment collaborator
//!
//! [`DeployBackend`] uploads a project snapshot to a hosting platform.
//! [`VercelDeployBackend`] talks to the Vercel deployments API.

mod backend;
mod vercel;

pub use backend::{DeployBackend, DeployFile, DeployOptions, DeployOutcome};
pub use vercel::VercelDeployBackend;
