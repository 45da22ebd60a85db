/// A single file touched by a unified diff.
/// Populated by the hunk-aware parser in parse.rs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffFile {
    /// File path taken from the `b/` side of the `diff --git` header
    pub file_path: String,
    /// Whether the header block declared `--- /dev/null`
    pub is_new: bool,
    /// Whether the header block declared `+++ /dev/null`
    pub is_deleted: bool,
    /// Hunks in the order they appear in the diff
    pub hunks: Vec<DiffHunk>,
}

impl DiffFile {
    pub(crate) fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            is_new: false,
            is_deleted: false,
            hunks: Vec::new(),
        }
    }
}

/// A contiguous region of changes within a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffHunk {
    /// The full `@@ ... @@` header line
    pub header: String,
    /// Raw lines of the hunk, context included, prefixes intact
    pub changes: Vec<String>,
}

impl DiffHunk {
    /// Added/removed line counts for this hunk.
    pub fn counts(&self) -> ChangeCounts {
        ChangeCounts::from_lines(self.changes.iter().map(String::as_str))
    }
}

/// Derived added/removed totals. Never stored on a hunk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeCounts {
    pub added: usize,
    pub removed: usize,
}

impl ChangeCounts {
    /// Count `+`/`-` lines, skipping the `+++`/`---` file markers.
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        let mut counts = ChangeCounts::default();
        for line in lines {
            counts.record(line);
        }
        counts
    }

    pub(crate) fn record(&mut self, line: &str) {
        if line.starts_with('+') && !line.starts_with("+++") {
            self.added += 1;
        } else if line.starts_with('-') && !line.starts_with("---") {
            self.removed += 1;
        }
    }
}

/// Whole-file line totals from the simple parse mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStat {
    pub file: String,
    pub added: usize,
    pub removed: usize,
}
