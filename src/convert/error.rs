//! Error taxonomy for the conversion engine.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    /// The input root is missing or not a directory. Fatal: nothing is converted.
    #[error("Input directory does not exist or is not a directory: {path} ({reason})")]
    InvalidInput { path: PathBuf, reason: String },
    /// The explicit content-locator override is not a valid CSS selector.
    #[error("Invalid main content selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to rewrite references in {path}: {reason}")]
    Rewrite { path: PathBuf, reason: String },
    #[error("Failed to serialize {path} to Markdown: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConvertError {
    pub(crate) fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        ConvertError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// True for errors that invalidate the whole run rather than one document.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ConvertError::InvalidInput { .. } | ConvertError::InvalidSelector { .. }
        )
    }
}
