//! Recording fakes and webhook payload builders shared by tests.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::ai::{AiError, Completion};
use crate::github::{CreatedPull, FixRequest, GitHubApi, GitHubError};

/// Completion fake that records prompts and replays canned answers.
pub struct FakeAi {
    replies: Mutex<VecDeque<String>>,
    last: String,
    configured: bool,
    prompts: Mutex<Vec<String>>,
}

impl FakeAi {
    pub fn replying(reply: &str) -> Self {
        Self::replying_in_order(vec![reply])
    }

    /// Answers in order, repeating the final answer once the list runs out.
    pub fn replying_in_order(replies: Vec<&str>) -> Self {
        Self {
            last: replies.last().map(|s| s.to_string()).unwrap_or_default(),
            replies: Mutex::new(replies.into_iter().map(str::to_string).collect()),
            configured: true,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::replying("")
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Completion for FakeAi {
    async fn complete(&self, prompt: &str, _system: Option<&str>) -> Result<String, AiError> {
        if !self.configured {
            return Err(AiError::NotConfigured);
        }
        self.prompts.lock().unwrap().push(prompt.to_string());
        let next = self.replies.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(|| self.last.clone()))
    }
}

/// GitHub fake that records every notification.
#[derive(Default)]
pub struct FakeGitHub {
    diff: Option<String>,
    fail_fix: bool,
    comments: Mutex<Vec<(String, String)>>,
    labels: Mutex<Vec<(String, Vec<String>)>>,
    fix_requests: Mutex<Vec<FixRequest>>,
}

impl FakeGitHub {
    pub fn with_diff(diff: &str) -> Self {
        Self {
            diff: Some(diff.to_string()),
            ..Self::default()
        }
    }

    pub fn failing_fix(mut self) -> Self {
        self.fail_fix = true;
        self
    }

    /// `(comments_url, body)` pairs in posting order.
    pub fn comments(&self) -> Vec<(String, String)> {
        self.comments.lock().unwrap().clone()
    }

    /// `("owner/repo#number", labels)` pairs in posting order.
    pub fn labels(&self) -> Vec<(String, Vec<String>)> {
        self.labels.lock().unwrap().clone()
    }

    pub fn fix_requests(&self) -> Vec<FixRequest> {
        self.fix_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GitHubApi for FakeGitHub {
    async fn comment(&self, comments_url: &str, body: &str) {
        self.comments
            .lock()
            .unwrap()
            .push((comments_url.to_string(), body.to_string()));
    }

    async fn label(&self, owner: &str, repo: &str, number: u64, labels: &[String]) {
        self.labels
            .lock()
            .unwrap()
            .push((format!("{owner}/{repo}#{number}"), labels.to_vec()));
    }

    async fn fetch_diff(&self, diff_url: &str) -> Result<String, GitHubError> {
        self.diff
            .clone()
            .ok_or_else(|| GitHubError::InvalidUrl(diff_url.to_string()))
    }

    async fn create_fix_pr(&self, request: &FixRequest) -> Result<CreatedPull, GitHubError> {
        self.fix_requests.lock().unwrap().push(request.clone());
        if self.fail_fix {
            return Err(GitHubError::InvalidUrl("fix branch refused".to_string()));
        }
        Ok(CreatedPull {
            number: 100,
            html_url: "https://github.com/octo/demo/pull/100".to_string(),
        })
    }
}

fn repository() -> Value {
    json!({"name": "demo", "full_name": "octo/demo", "owner": {"login": "octo", "id": 1}})
}

fn pull_request(merged: bool) -> Value {
    json!({
        "number": 9,
        "title": "Add retries",
        "body": "Retries flaky requests.",
        "user": {"login": "alice"},
        "comments_url": "https://api.github.com/repos/octo/demo/issues/9/comments",
        "diff_url": "https://github.com/octo/demo/pull/9.diff",
        "merged": merged,
        "base": {"ref": "main", "sha": "0123abc"},
        "head": {"ref": "feature", "sha": "4567def"}
    })
}

pub fn issue_payload(action: &str) -> Value {
    json!({
        "action": action,
        "issue": {
            "number": 4,
            "title": "Crash on start",
            "body": "It panics when the config file is empty.",
            "comments_url": "https://api.github.com/repos/octo/demo/issues/4/comments",
            "user": {"login": "carol"}
        },
        "repository": repository()
    })
}

pub fn pull_request_payload(action: &str, merged: bool) -> Value {
    json!({
        "action": action,
        "number": 9,
        "pull_request": pull_request(merged),
        "repository": repository()
    })
}

pub fn review_comment_payload() -> Value {
    json!({
        "action": "created",
        "comment": {"body": "Why not use a map here?", "user": {"login": "bob"}},
        "pull_request": pull_request(false),
        "repository": repository()
    })
}
