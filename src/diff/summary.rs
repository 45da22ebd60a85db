use std::fmt::Write as _;

use super::parse::parse;
use super::types::{DiffFile, FileStat};

/// Change lines shown per hunk in the digest.
pub const PREVIEW_LINES: usize = 6;
/// Characters kept from each preview line.
pub const PREVIEW_LINE_CHARS: usize = 120;
/// Characters of raw diff forwarded alongside the digest in review prompts.
pub const RAW_DIFF_PROMPT_CHARS: usize = 20_000;

/// Parse `diff_text` and format it as a bounded digest.
pub fn summarize(diff_text: &str) -> String {
    format_digest(&parse(diff_text))
}

/// Format parsed files as a digest readable by people and models alike.
///
/// Output per file:
///
/// ```text
/// ### File: src/main.rs
///
///   @@ -1,5 +1,7 @@
///   Changes: +2 / -1
///   Preview:
/// <up to six change lines, each cut to 120 characters>
/// ```
pub fn format_digest(files: &[DiffFile]) -> String {
    let mut out = String::new();

    for file in files {
        let marker = match (file.is_new, file.is_deleted) {
            (true, _) => " (new file)",
            (_, true) => " (deleted)",
            _ => "",
        };
        let _ = writeln!(out, "\n### File: {}{}", file.file_path, marker);

        for hunk in &file.hunks {
            let counts = hunk.counts();
            let _ = writeln!(out, "\n  {}", hunk.header);
            let _ = writeln!(out, "  Changes: +{} / -{}", counts.added, counts.removed);

            let preview = hunk
                .changes
                .iter()
                .take(PREVIEW_LINES)
                .map(|line| truncate_chars(line, PREVIEW_LINE_CHARS))
                .collect::<Vec<_>>()
                .join("\n");
            let _ = writeln!(out, "  Preview:\n{}", preview);
        }
    }

    out
}

/// One `path: +A / -R` line per file.
pub fn format_stats(stats: &[FileStat]) -> String {
    stats
        .iter()
        .map(|s| format!("{}: +{} / -{}", s.file, s.added, s.removed))
        .collect::<Vec<_>>()
        .join("\n")
}

/// First `max_chars` characters of `text`, never splitting a UTF-8 sequence.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub fn issue_reply_prompt(title: &str, body: &str) -> String {
    format!(
        "Reply to this issue briefly and kindly, and give some quick suggestions.\n\n\
         Title: {title}\n\nBody: {body}"
    )
}

/// Prompt asking for a summary and review of a pull request.
///
/// Carries the per-file stats, the hunk digest and the head of the raw diff.
pub fn review_prompt(
    title: &str,
    description: &str,
    stats: &str,
    digest: &str,
    diff_text: &str,
) -> String {
    format!(
        "Summarize and review the pull request below from a developer's point of view. \
         List the three main problems, suggestions for improvement and short fix \
         snippets where possible.\n\n\
         Title: {title}\n\n\
         Description: {description}\n\n\
         Diff summary:\n{stats}\n\n\
         Diff digest:\n{digest}\n\n\
         Full diff:\n{}",
        truncate_chars(diff_text, RAW_DIFF_PROMPT_CHARS)
    )
}

pub fn fix_patch_prompt(digest: &str) -> String {
    format!(
        "Based on the pull request diff below, produce fix patches that can be applied \
         directly. Output JSON only, in the form \
         [{{\"path\": \"relative/path.js\", \"content\": \"new full file content\"}}]. \
         Do not output any other text.\n\n{digest}"
    )
}

pub fn fix_suggestion_prompt(digest: &str) -> String {
    format!(
        "Based on the pull request diff below, give concise fix suggestions (code snippets \
         or commands) that the developer can apply by hand.\n\n{digest}"
    )
}

pub fn review_comment_reply_prompt(comment: &str) -> String {
    format!("A review comment says:\n\n{comment}\n\nPlease answer it politely.")
}
