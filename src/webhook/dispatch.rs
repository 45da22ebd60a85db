//! Event dispatch: one table keyed by `(event, action)` and one handler per
//! route, all sharing the same AI client and GitHub notifier.

use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::ai::{AiError, Completion};
use crate::autofix;
use crate::diff::{self, summary};
use crate::github::types::{IssuesEvent, PullRequest, PullRequestEvent, ReviewCommentEvent};
use crate::github::{FixRequest, GitHubApi};

const REVIEWER_SYSTEM_PROMPT: &str =
    "You are a careful senior engineer reviewing code changes on GitHub.";

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Invalid webhook payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error(transparent)]
    Ai(#[from] AiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    IssueOpened,
    PullRequestReview,
    PullRequestClosed,
    ReviewCommentReply,
}

const ROUTES: &[(&str, &str, Route)] = &[
    ("issues", "opened", Route::IssueOpened),
    ("pull_request", "opened", Route::PullRequestReview),
    ("pull_request", "synchronize", Route::PullRequestReview),
    ("pull_request", "closed", Route::PullRequestClosed),
    ("pull_request_review_comment", "created", Route::ReviewCommentReply),
];

/// Route for an event type and payload action, if the bot handles it.
pub fn route_for(event: &str, action: &str) -> Option<Route> {
    ROUTES
        .iter()
        .find(|(e, a, _)| *e == event && *a == action)
        .map(|(_, _, route)| *route)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Handled(Route),
    Ignored,
}

#[derive(Debug, Clone)]
pub struct BotSettings {
    pub default_label: String,
    pub auto_apply_fix: bool,
}

pub struct Dispatcher {
    ai: Arc<dyn Completion>,
    github: Arc<dyn GitHubApi>,
    settings: BotSettings,
}

impl Dispatcher {
    pub fn new(ai: Arc<dyn Completion>, github: Arc<dyn GitHubApi>, settings: BotSettings) -> Self {
        Self {
            ai,
            github,
            settings,
        }
    }

    /// Handle one verified delivery.
    pub async fn dispatch(&self, event: &str, payload: Value) -> Result<Outcome, DispatchError> {
        let action = payload
            .get("action")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let Some(route) = route_for(event, action) else {
            debug!(event, action, "no route for delivery");
            return Ok(Outcome::Ignored);
        };

        match route {
            Route::IssueOpened => self.issue_opened(serde_json::from_value(payload)?).await?,
            Route::PullRequestReview => self.review_pull_request(serde_json::from_value(payload)?).await?,
            Route::PullRequestClosed => self.pull_request_closed(serde_json::from_value(payload)?).await,
            Route::ReviewCommentReply => self.reply_to_review_comment(serde_json::from_value(payload)?).await?,
        }
        Ok(Outcome::Handled(route))
    }

    fn labels(&self) -> Vec<String> {
        vec![self.settings.default_label.clone()]
    }

    #[instrument(skip_all, fields(repo = %event.repository.name, issue = event.issue.number, action = %event.action))]
    async fn issue_opened(&self, event: IssuesEvent) -> Result<(), DispatchError> {
        let issue = &event.issue;
        let prompt =
            summary::issue_reply_prompt(&issue.title, issue.body.as_deref().unwrap_or_default());
        let reply = self.ai.complete(&prompt, None).await?;

        self.github
            .label(&event.repository.owner.login, &event.repository.name, issue.number, &self.labels())
            .await;
        self.github
            .comment(&issue.comments_url, &format!("🤖 AI reply:\n\n{reply}"))
            .await;
        info!("replied to issue");
        Ok(())
    }

    #[instrument(skip_all, fields(repo = %event.repository.name, pr = event.pull_request.number, action = %event.action))]
    async fn review_pull_request(&self, event: PullRequestEvent) -> Result<(), DispatchError> {
        let pr = &event.pull_request;
        let diff_text = match self.github.fetch_diff(&pr.diff_url).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "could not fetch diff, skipping review");
                return Ok(());
            }
        };

        let stats = summary::format_stats(&diff::parse_simple(&diff_text));
        let digest = diff::summarize(&diff_text);
        debug!(diff_bytes = diff_text.len(), digest_chars = digest.len(), "summarized diff");

        let prompt = summary::review_prompt(
            &pr.title,
            pr.body.as_deref().unwrap_or_default(),
            &stats,
            &digest,
            &diff_text,
        );
        let review = self.ai.complete(&prompt, Some(REVIEWER_SYSTEM_PROMPT)).await?;
        self.github
            .comment(
                &pr.comments_url,
                &format!(
                    "### 🤖 PR summary and review\n\n**Changed files**:\n```\n{stats}\n```\n\n**AI review**:\n{review}"
                ),
            )
            .await;
        self.github
            .label(&event.repository.owner.login, &event.repository.name, pr.number, &self.labels())
            .await;

        if self.settings.auto_apply_fix {
            self.apply_fix(&event, &digest).await?;
        } else {
            let suggestion = self
                .ai
                .complete(&summary::fix_suggestion_prompt(&digest), Some(REVIEWER_SYSTEM_PROMPT))
                .await?;
            self.github
                .comment(&pr.comments_url, &format!("🔧 Fix suggestions (AI):\n\n{suggestion}"))
                .await;
        }
        info!("reviewed pull request");
        Ok(())
    }

    /// Ask for full-file patches and, if they parse, commit them to a fix
    /// branch and open a PR. Unparseable answers are posted as advice.
    async fn apply_fix(&self, event: &PullRequestEvent, digest: &str) -> Result<(), DispatchError> {
        let pr = &event.pull_request;
        let answer = self
            .ai
            .complete(&summary::fix_patch_prompt(digest), Some(REVIEWER_SYSTEM_PROMPT))
            .await?;

        let Some(files) = autofix::parse_patches(&answer) else {
            debug!("model answer has no usable patches");
            self.github
                .comment(&pr.comments_url, &format!("🔧 Fix suggestions (apply manually):\n\n{answer}"))
                .await;
            return Ok(());
        };

        warn!(files = files.len(), "committing AI-authored patches without review");
        let request = FixRequest {
            owner: event.repository.owner.login.clone(),
            repo: event.repository.name.clone(),
            base_branch: pr.base.ref_name.clone(),
            branch: autofix::fix_branch_name(),
            message: format!("AI auto-fix for PR #{}", pr.number),
            files,
        };
        let body = match self.github.create_fix_pr(&request).await {
            Ok(pull) => format!("🤖 Opened an automated fix PR: {}", pull.html_url),
            Err(e) => {
                warn!(error = %e, "automated fix failed");
                format!("⚠️ Failed to apply the automated fix: {e}")
            }
        };
        self.github.comment(&pr.comments_url, &body).await;
        Ok(())
    }

    #[instrument(skip_all, fields(repo = %event.repository.name, pr = event.pull_request.number))]
    async fn pull_request_closed(&self, event: PullRequestEvent) {
        let pr = &event.pull_request;
        if pr.merged != Some(true) {
            debug!("pull request closed without merge");
            return;
        }
        self.github
            .comment(&pr.comments_url, &format!("📝 Changelog entry:\n\n{}", changelog_entry(pr)))
            .await;
        info!("posted changelog entry");
    }

    #[instrument(skip_all, fields(repo = %event.repository.name, pr = event.pull_request.number, action = %event.action))]
    async fn reply_to_review_comment(&self, event: ReviewCommentEvent) -> Result<(), DispatchError> {
        let prompt = summary::review_comment_reply_prompt(&event.comment.body);
        let reply = self.ai.complete(&prompt, None).await?;
        self.github
            .comment(
                &event.pull_request.comments_url,
                &format!("🤖 Reply to @{} (AI):\n\n{reply}", event.comment.user.login),
            )
            .await;
        Ok(())
    }
}

/// `- PR #12 Title (@author)`
pub fn changelog_entry(pr: &PullRequest) -> String {
    format!("- PR #{} {} (@{})", pr.number, pr.title, pr.user.login)
}
