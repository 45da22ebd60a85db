//! Turning a model's patch answer into a fix branch.
//!
//! The model is asked for `[{"path": ..., "content": ...}]`. Anything that
//! doesn't parse into at least one patch is treated as free-form advice.
//! Patches are committed without human review, so this path only runs when
//! `fix.auto_apply` is enabled.

use chrono::Utc;

use crate::github::FilePatch;

/// Extract file patches from a model reply.
///
/// Takes the text between the first `[` and the last `]`, which tolerates
/// prose or code fences around the JSON array.
pub fn parse_patches(reply: &str) -> Option<Vec<FilePatch>> {
    let start = reply.find('[')?;
    let end = reply.rfind(']')?;
    if end < start {
        return None;
    }
    let patches: Vec<FilePatch> = serde_json::from_str(&reply[start..=end]).ok()?;
    (!patches.is_empty()).then_some(patches)
}

/// `ai-fix-<unix millis>`
pub fn fix_branch_name() -> String {
    format!("ai-fix-{}", Utc::now().timestamp_millis())
}
