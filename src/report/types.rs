use crate::diff::FileStat;

/// Offline digest of a diff, as printed by the `digest` subcommand.
#[derive(Debug)]
pub struct DigestReport {
    /// Per-file line counts, in diff order
    pub files: Vec<FileStat>,
    /// Lines added across all files
    pub total_added: usize,
    /// Lines removed across all files
    pub total_removed: usize,
    /// Hunk digest, the same text forwarded to the model in reviews
    pub digest: String,
}

impl DigestReport {
    pub fn files_changed(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
