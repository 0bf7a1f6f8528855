//! Resource errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading origins or materializing resources.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// Filesystem I/O failed.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The archive could not be read.
    #[error("invalid archive '{path}': {message}")]
    Archive { path: PathBuf, message: String },

    /// An entry uses a compression method other than store/deflate.
    #[error("unsupported compression method {method} for '{entry}' in '{path}'")]
    UnsupportedCompression {
        path: PathBuf,
        entry: String,
        method: String,
    },

    /// A relative path would leave its root.
    #[error("path '{path}' escapes root '{root}'")]
    Escape { path: String, root: PathBuf },

    /// Overlay is off and the destination already holds the file.
    #[error("destination already exists: {0}")]
    DestinationExists(PathBuf),

    /// Directory traversal failed.
    #[error("failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),
}

impl ResourceError {
    /// Creates an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an archive error.
    pub fn archive(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Archive {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a containment violation.
    pub fn escape(path: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self::Escape {
            path: path.into(),
            root: root.into(),
        }
    }

    /// Returns `true` for containment violations.
    #[must_use]
    pub fn is_escape(&self) -> bool {
        matches!(self, Self::Escape { .. })
    }
}
