use super::types::{ChangeCounts, DiffFile, DiffHunk, FileStat};

const FILE_MARKER: &str = "diff --git ";
const HUNK_MARKER: &str = "@@";

/// Parse a unified diff into per-file, per-hunk records.
///
/// The input is the raw text from GitHub's diff endpoint. Each file section
/// starts with:
///   diff --git a/{path} b/{path}
///
/// Hunks start with `@@ ... @@` and every following line up to the next hunk
/// or file header is kept verbatim, context lines included.
///
/// Parsing never fails. Lines that appear before any file header, or before
/// the first hunk of a file, have nothing to attach to and are dropped. The
/// only header lines inspected in that region are `--- /dev/null` (new file)
/// and `+++ /dev/null` (deleted file).
pub fn parse(diff_text: &str) -> Vec<DiffFile> {
    let mut files = Vec::new();
    let mut current_file: Option<DiffFile> = None;
    let mut current_hunk: Option<DiffHunk> = None;

    let finish_hunk = |file: &mut Option<DiffFile>, hunk: &mut Option<DiffHunk>| {
        if let (Some(file), Some(hunk)) = (file.as_mut(), hunk.take()) {
            file.hunks.push(hunk);
        }
    };

    let finish_file =
        |files: &mut Vec<DiffFile>, file: &mut Option<DiffFile>, hunk: &mut Option<DiffHunk>| {
            finish_hunk(file, hunk);
            if let Some(file) = file.take() {
                files.push(file);
            }
        };

    for line in diff_text.lines() {
        if let Some(rest) = line.strip_prefix(FILE_MARKER) {
            finish_file(&mut files, &mut current_file, &mut current_hunk);
            current_file = Some(DiffFile::new(path_from_git_header(rest)));
            continue;
        }

        if line.starts_with(HUNK_MARKER) {
            finish_hunk(&mut current_file, &mut current_hunk);
            if current_file.is_some() {
                current_hunk = Some(DiffHunk {
                    header: line.to_string(),
                    changes: Vec::new(),
                });
            }
            continue;
        }

        match (current_file.as_mut(), current_hunk.as_mut()) {
            (Some(_), Some(hunk)) => hunk.changes.push(line.to_string()),
            (Some(file), None) => mark_file_header(file, line),
            _ => {}
        }
    }

    finish_file(&mut files, &mut current_file, &mut current_hunk);
    files
}

/// Whole-file line totals, ignoring hunk boundaries.
///
/// Splits only on `diff --git` lines and counts `+`/`-` lines across each
/// block. Blocks whose header doesn't look like `a/<path> b/<path>` are
/// skipped.
pub fn parse_simple(diff_text: &str) -> Vec<FileStat> {
    let mut stats = Vec::new();
    let mut current: Option<(String, ChangeCounts)> = None;

    for line in diff_text.lines() {
        if let Some(rest) = line.strip_prefix(FILE_MARKER) {
            stats.extend(current.take());
            current = simple_file_name(rest).map(|file| (file, ChangeCounts::default()));
            continue;
        }
        if let Some((_, counts)) = current.as_mut() {
            counts.record(line);
        }
    }
    stats.extend(current);

    stats
        .into_iter()
        .map(|(file, counts)| FileStat {
            file,
            added: counts.added,
            removed: counts.removed,
        })
        .collect()
}

/// Path on the `b/` side of a `diff --git` header. Falls back to the last
/// token when no ` b/` segment is present.
fn path_from_git_header(rest: &str) -> String {
    if let Some(idx) = rest.rfind(" b/") {
        return rest[idx + 3..].trim_end().to_string();
    }
    let last = rest.split_whitespace().last().unwrap_or_default();
    last.strip_prefix("b/").unwrap_or(last).to_string()
}

/// Matches `a/<path> b/<path>` and returns the second path. The first path
/// must be non-empty and ends at the first ` b/` after it.
fn simple_file_name(header: &str) -> Option<String> {
    let tail = &header[header.find("a/")? + 2..];
    let first = tail.chars().next()?.len_utf8();
    let split = tail[first..].find(" b/")? + first;
    let name = &tail[split + 3..];
    (!name.is_empty()).then(|| name.to_string())
}

fn mark_file_header(file: &mut DiffFile, line: &str) {
    if let Some(path) = line.strip_prefix("--- ") {
        if path.trim() == "/dev/null" {
            file.is_new = true;
        }
    } else if let Some(path) = line.strip_prefix("+++ ") {
        if path.trim() == "/dev/null" {
            file.is_deleted = true;
        }
    }
}
