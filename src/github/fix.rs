//! Fix branch creation through the git refs, Contents and Pulls APIs.
//!
//! Steps: resolve the base branch sha, create the fix branch from it, write
//! each file with a Contents API PUT, then open a PR from the fix branch.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::{Method, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::types::{CreatedPull, FixRequest};
use super::{GitHubClient, GitHubError};

const PR_BODY: &str = "Automated fix suggestions from AI";

#[derive(Deserialize)]
struct GitRefResponse {
    object: GitObject,
}

#[derive(Deserialize)]
struct GitObject {
    sha: String,
}

#[derive(Deserialize)]
struct ContentResponse {
    sha: String,
}

#[derive(Serialize)]
struct PutContents<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<String>,
}

pub(crate) async fn create_fix_pr(
    client: &GitHubClient,
    request: &FixRequest,
) -> Result<CreatedPull, GitHubError> {
    let FixRequest {
        owner,
        repo,
        base_branch,
        ..
    } = request;

    let base_sha = branch_sha(client, owner, repo, base_branch).await?;
    debug!(base = %base_branch, sha = %base_sha, "resolved base branch");

    let branch = match create_branch(client, owner, repo, &request.branch, &base_sha).await {
        Ok(()) => request.branch.clone(),
        Err(e) => {
            let retry = format!("{}-{}", request.branch, chrono::Utc::now().timestamp_millis());
            warn!(error = %e, branch = %request.branch, retry = %retry, "branch creation failed, retrying");
            create_branch(client, owner, repo, &retry, &base_sha).await?;
            retry
        }
    };

    for file in &request.files {
        let url = contents_url(client, owner, repo, &file.path)?;
        let sha = existing_sha(client, url.clone(), base_branch).await;
        let body = PutContents {
            message: &request.message,
            content: BASE64.encode(file.content.as_bytes()),
            branch: &branch,
            sha,
        };
        client
            .request(Method::PUT, url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        debug!(path = %file.path, branch = %branch, "wrote file to fix branch");
    }

    let pull = client
        .request(Method::POST, client.api_url(&format!("/repos/{owner}/{repo}/pulls")))
        .json(&serde_json::json!({
            "title": request.message,
            "head": branch,
            "base": base_branch,
            "body": PR_BODY,
        }))
        .send()
        .await?
        .error_for_status()?
        .json::<CreatedPull>()
        .await?;
    info!(number = pull.number, url = %pull.html_url, "opened fix pull request");

    Ok(pull)
}

async fn branch_sha(
    client: &GitHubClient,
    owner: &str,
    repo: &str,
    branch: &str,
) -> Result<String, GitHubError> {
    let url = client.api_url(&format!("/repos/{owner}/{repo}/git/ref/heads/{branch}"));
    let git_ref = client
        .request(Method::GET, url)
        .send()
        .await?
        .error_for_status()?
        .json::<GitRefResponse>()
        .await?;
    Ok(git_ref.object.sha)
}

async fn create_branch(
    client: &GitHubClient,
    owner: &str,
    repo: &str,
    branch: &str,
    sha: &str,
) -> Result<(), GitHubError> {
    client
        .request(Method::POST, client.api_url(&format!("/repos/{owner}/{repo}/git/refs")))
        .json(&serde_json::json!({ "ref": format!("refs/heads/{branch}"), "sha": sha }))
        .send()
        .await?
        .error_for_status()?;
    Ok(())
}

/// Sha of the file on the base branch, or `None` when it doesn't exist yet
/// or the lookup fails.
async fn existing_sha(client: &GitHubClient, mut url: Url, base_branch: &str) -> Option<String> {
    url.query_pairs_mut().append_pair("ref", base_branch);
    let response = client
        .request(Method::GET, url)
        .send()
        .await
        .ok()?
        .error_for_status()
        .ok()?;
    response.json::<ContentResponse>().await.ok().map(|c| c.sha)
}

/// `/repos/{owner}/{repo}/contents/{path}` with each path segment encoded.
fn contents_url(
    client: &GitHubClient,
    owner: &str,
    repo: &str,
    path: &str,
) -> Result<Url, GitHubError> {
    let base = client.api_url(&format!("/repos/{owner}/{repo}/contents"));
    let mut url = Url::parse(&base).map_err(|_| GitHubError::InvalidUrl(base.clone()))?;
    url.path_segments_mut()
        .map_err(|_| GitHubError::InvalidUrl(base.clone()))?
        .extend(path.split('/').filter(|s| !s.is_empty()));
    Ok(url)
}
