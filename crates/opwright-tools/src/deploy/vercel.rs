use super::backend::{DeployBackend, DeployFile, DeployOptions, DeployOutcome};
use crate::error::{Error, Result};
use base64::Engine;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

const DEFAULT_API_BASE: &str = "https://api.vercel.com";
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Deploys through the Vercel REST API with inline file uploads.
#[derive(Debug, Clone)]
pub struct VercelDeployBackend {
    client: reqwest::Client,
    api_base: String,
}

impl VercelDeployBackend {
    /// Create a backend against the public API
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            api_base: DEFAULT_API_BASE.to_string(),
        })
    }

    /// Point the backend at a different API host
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }
}

/// Request body for `POST /v13/deployments`
pub(crate) fn build_request(files: &[DeployFile], project_name: &str, opts: &DeployOptions) -> Value {
    let files: Vec<Value> = files
        .iter()
        .map(|f| {
            json!({
                "file": f.path,
                "data": base64::engine::general_purpose::STANDARD.encode(&f.data),
                "encoding": "base64",
            })
        })
        .collect();
    let env: serde_json::Map<String, Value> = opts
        .env
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();

    json!({
        "name": project_name,
        "files": files,
        "target": "production",
        "projectSettings": { "framework": Value::Null },
        "env": env,
        "build": { "env": env },
    })
}

/// Extract the outcome from a successful response body
pub(crate) fn parse_response(body: &Value) -> Result<DeployOutcome> {
    let id = body
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Network("deployment response has no id".to_string()))?
        .to_string();
    let url = body.get("url").and_then(Value::as_str).map(|u| {
        if u.starts_with("http://") || u.starts_with("https://") {
            u.to_string()
        } else {
            format!("https://{}", u)
        }
    });
    let state = body
        .get("readyState")
        .or_else(|| body.get("status"))
        .and_then(Value::as_str)
        .map(str::to_string);
    Ok(DeployOutcome { url, id, state })
}

#[async_trait::async_trait]
impl DeployBackend for VercelDeployBackend {
    async fn deploy(
        &self,
        files: Vec<DeployFile>,
        project_name: &str,
        token: &str,
        opts: &DeployOptions,
    ) -> Result<DeployOutcome> {
        if !opts.platform.eq_ignore_ascii_case("vercel") {
            return Err(Error::InvalidInput(format!(
                "Unsupported deploy platform: {}",
                opts.platform
            )));
        }
        if files.is_empty() {
            return Err(Error::InvalidInput("nothing to deploy: project has no files".to_string()));
        }
        if token.trim().is_empty() {
            return Err(Error::PermissionDenied("deployment token is empty".to_string()));
        }

        debug!(project = %project_name, files = files.len(), "Creating Vercel deployment");
        let body = build_request(&files, project_name, opts);
        let response = self
            .client
            .post(format!("{}/v13/deployments", self.api_base))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Vercel API request failed: {}", e)))?;

        let status = response.status().as_u16();
        let response_body: Value = response
            .json()
            .await
            .map_err(|e| Error::Network(format!("Failed to parse Vercel response: {}", e)))?;

        if !(200..300).contains(&status) {
            let message = response_body
                .pointer("/error/message")
                .and_then(Value::as_str)
                .unwrap_or("Unknown error")
                .to_string();
            return Err(Error::Api { status, message });
        }

        let outcome = parse_response(&response_body)?;
        info!(project = %project_name, id = %outcome.id, url = ?outcome.url, "Deployment created");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str, data: &[u8]) -> DeployFile {
        DeployFile {
            path: path.to_string(),
            data: data.to_vec(),
        }
    }

    #[test]
    fn test_build_request_inlines_base64_files() {
        let opts = DeployOptions::new("vercel").with_env("API_URL", "https://api.example.com");
        let body = build_request(&[file("index.html", b"<h1>hi</h1>")], "site", &opts);

        assert_eq!(body["name"], "site");
        assert_eq!(body["files"][0]["file"], "index.html");
        assert_eq!(body["files"][0]["encoding"], "base64");
        assert_eq!(body["files"][0]["data"], "PGgxPmhpPC9oMT4=");
        assert_eq!(body["env"]["API_URL"], "https://api.example.com");
    }

    #[test]
    fn test_parse_response_prefixes_url() {
        let body = json!({"id": "dpl_1", "url": "site-abc.vercel.app", "readyState": "QUEUED"});
        let outcome = parse_response(&body).unwrap();
        assert_eq!(outcome.id, "dpl_1");
        assert_eq!(outcome.url.as_deref(), Some("https://site-abc.vercel.app"));
        assert_eq!(outcome.state.as_deref(), Some("QUEUED"));
    }

    #[test]
    fn test_parse_response_requires_id() {
        assert!(parse_response(&json!({"url": "x.vercel.app"})).is_err());
    }

    #[tokio::test]
    async fn test_unknown_platform_rejected() {
        let backend = VercelDeployBackend::new().unwrap();
        let result = backend
            .deploy(vec![file("a", b"a")], "site", "tok", &DeployOptions::new("heroku"))
            .await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_empty_project_rejected() {
        let backend = VercelDeployBackend::new().unwrap();
        let result = backend
            .deploy(Vec::new(), "site", "tok", &DeployOptions::new("vercel"))
            .await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
