//! Unified diff parsing and the bounded digest forwarded to the model.

pub mod parse;
pub mod summary;
pub mod types;

pub use parse::parse_simple;
pub use summary::summarize;
pub use types::FileStat;
