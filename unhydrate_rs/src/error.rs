use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Per-page failure. None of these stop sibling pages from being processed.
#[derive(Debug, Error)]
pub enum PageError {
    /// No readable entry module: the page is excluded, never classified.
    #[error("no entry source module for {}", .0.display())]
    MissingEntry(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    ReadHtml {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed HTML in {}: {reason}", path.display())]
    MalformedHtml { path: PathBuf, reason: String },
}

impl PageError {
    pub fn is_skip(&self) -> bool {
        matches!(self, PageError::MissingEntry(_))
    }
}
