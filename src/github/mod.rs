pub mod fix;
pub mod types;

pub use types::{CreatedPull, FilePatch, FixRequest};

use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Method, RequestBuilder};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, warn};

const USER_AGENT_VALUE: &str = "pr-assistant";
const JSON_MEDIA_TYPE: &str = "application/vnd.github.v3+json";
const DIFF_MEDIA_TYPE: &str = "application/vnd.github.v3.diff";
const DIFF_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub API request failed: {0}")]
    ApiRequest(#[from] reqwest::Error),

    #[error("Invalid GitHub URL: {0}")]
    InvalidUrl(String),
}

/// GitHub operations used by the webhook dispatcher.
///
/// `comment` and `label` never fail from the caller's point of view: errors
/// are logged and dropped so one notification can't block another.
#[async_trait]
pub trait GitHubApi: Send + Sync {
    async fn comment(&self, comments_url: &str, body: &str);

    async fn label(&self, owner: &str, repo: &str, number: u64, labels: &[String]);

    /// Raw unified diff behind a PR's `diff_url`.
    async fn fetch_diff(&self, diff_url: &str) -> Result<String, GitHubError>;

    /// Commit `request.files` to a new branch and open a PR for it.
    async fn create_fix_pr(&self, request: &FixRequest) -> Result<CreatedPull, GitHubError>;
}

/// reqwest-backed GitHub REST client.
pub struct GitHubClient {
    http: reqwest::Client,
    token: String,
    api_base: String,
}

impl GitHubClient {
    pub fn new(token: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            token: token.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    pub(crate) fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    pub(crate) fn request(&self, method: Method, url: impl reqwest::IntoUrl) -> RequestBuilder {
        self.request_accepting(method, url, JSON_MEDIA_TYPE)
    }

    fn request_accepting(
        &self,
        method: Method,
        url: impl reqwest::IntoUrl,
        accept: &str,
    ) -> RequestBuilder {
        self.http
            .request(method, url)
            .header(USER_AGENT, USER_AGENT_VALUE)
            .header(ACCEPT, accept)
            .bearer_auth(&self.token)
    }

    /// Post a comment, surfacing failures.
    pub async fn try_comment(&self, comments_url: &str, body: &str) -> Result<(), GitHubError> {
        self.request(Method::POST, comments_url)
            .json(&serde_json::json!({ "body": body }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Add labels, surfacing failures.
    pub async fn try_label(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        labels: &[String],
    ) -> Result<(), GitHubError> {
        let url = self.api_url(&format!("/repos/{owner}/{repo}/issues/{number}/labels"));
        self.request(Method::POST, url)
            .json(&serde_json::json!({ "labels": labels }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl GitHubApi for GitHubClient {
    #[instrument(skip(self, body), fields(body_chars = body.len()))]
    async fn comment(&self, comments_url: &str, body: &str) {
        match self.try_comment(comments_url, body).await {
            Ok(()) => debug!("comment posted"),
            Err(e) => warn!(error = %e, "failed to post comment"),
        }
    }

    #[instrument(skip(self))]
    async fn label(&self, owner: &str, repo: &str, number: u64, labels: &[String]) {
        match self.try_label(owner, repo, number, labels).await {
            Ok(()) => debug!("labels added"),
            Err(e) => warn!(error = %e, "failed to add labels"),
        }
    }

    #[instrument(skip(self))]
    async fn fetch_diff(&self, diff_url: &str) -> Result<String, GitHubError> {
        let diff_text = self
            .request_accepting(Method::GET, diff_url, DIFF_MEDIA_TYPE)
            .timeout(DIFF_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        debug!(diff_bytes = diff_text.len(), "received PR diff");
        Ok(diff_text)
    }

    #[instrument(skip(self, request), fields(owner = %request.owner, repo = %request.repo, files = request.files.len()))]
    async fn create_fix_pr(&self, request: &FixRequest) -> Result<CreatedPull, GitHubError> {
        fix::create_fix_pr(self, request).await
    }
}
