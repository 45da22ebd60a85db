use serde::{Deserialize, Serialize};

/// `issues` event payload (fields this bot reads).
#[derive(Debug, Clone, Deserialize)]
pub struct IssuesEvent {
    pub action: String,
    pub issue: Issue,
    pub repository: Repository,
}

/// `pull_request` event payload.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestEvent {
    pub action: String,
    pub pull_request: PullRequest,
    pub repository: Repository,
}

/// `pull_request_review_comment` event payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewCommentEvent {
    pub action: String,
    pub comment: Comment,
    pub pull_request: PullRequest,
    pub repository: Repository,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub comments_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub user: Account,
    /// Issue comments endpoint for this PR
    pub comments_url: String,
    pub diff_url: String,
    #[serde(default)]
    pub merged: Option<bool>,
    pub base: BranchRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BranchRef {
    #[serde(rename = "ref")]
    pub ref_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Comment {
    pub body: String,
    pub user: Account,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
    pub owner: Account,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub login: String,
}

/// Full replacement content for one file in a fix branch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FilePatch {
    pub path: String,
    pub content: String,
}

/// Everything needed to open a fix PR against `base_branch`.
#[derive(Debug, Clone)]
pub struct FixRequest {
    pub owner: String,
    pub repo: String,
    pub base_branch: String,
    /// Preferred branch name; a timestamp suffix is added if it already exists
    pub branch: String,
    /// Used as the commit message and the PR title
    pub message: String,
    pub files: Vec<FilePatch>,
}

/// Pull request returned by `POST /repos/{owner}/{repo}/pulls`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedPull {
    pub number: u64,
    pub html_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_pull_request_event() {
        let payload = json!({
            "action": "closed",
            "number": 7,
            "pull_request": {
                "number": 7,
                "title": "Fix typo",
                "body": null,
                "user": {"login": "octocat", "id": 1},
                "comments_url": "https://api.github.com/repos/o/r/issues/7/comments",
                "diff_url": "https://github.com/o/r/pull/7.diff",
                "merged": true,
                "base": {"ref": "main", "sha": "abc"}
            },
            "repository": {"name": "r", "owner": {"login": "o"}}
        });
        let event: PullRequestEvent = serde_json::from_value(payload).unwrap();
        assert_eq!(event.pull_request.base.ref_name, "main");
        assert_eq!(event.pull_request.merged, Some(true));
        assert!(event.pull_request.body.is_none());
        assert_eq!(event.repository.owner.login, "o");
    }

    #[test]
    fn test_issue_and_review_comment_events_carry_action() {
        let issue: IssuesEvent = serde_json::from_value(crate::test_support::issue_payload("opened")).unwrap();
        assert_eq!(issue.action, "opened");
        assert_eq!(issue.issue.number, 4);

        let review: ReviewCommentEvent =
            serde_json::from_value(crate::test_support::review_comment_payload()).unwrap();
        assert_eq!(review.action, "created");
        assert_eq!(review.comment.user.login, "bob");
    }

    #[test]
    fn test_merged_defaults_to_none() {
        let payload = json!({
            "number": 1,
            "title": "t",
            "user": {"login": "u"},
            "comments_url": "c",
            "diff_url": "d",
            "base": {"ref": "main"}
        });
        let pr: PullRequest = serde_json::from_value(payload).unwrap();
        assert_eq!(pr.merged, None);
        assert!(pr.body.is_none());
    }
}
