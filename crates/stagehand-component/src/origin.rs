//! Component origins.
//!
//! An origin is the archive or directory a descriptor was loaded from.
//! Resources and component config files are resolved relative to it:
//!
//! ```text
//! <origin>/
//! ├── META-INF/components-def.xml   descriptor document
//! ├── <config-file>                 optional settings file
//! └── webapp/                       resource subtree
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Directory holding the descriptor document inside an origin.
pub const DESCRIPTOR_DIR: &str = "META-INF";

/// Fixed file name of the descriptor document.
pub const DESCRIPTOR_FILE: &str = "components-def.xml";

/// Descriptor location relative to the origin root.
pub const DESCRIPTOR_PATH: &str = "META-INF/components-def.xml";

/// File extensions treated as packaged archives.
pub const ARCHIVE_EXTENSIONS: &[&str] = &["zip", "jar"];

/// Where a component was loaded from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Origin {
    /// A packaged archive (`.zip` / `.jar`).
    Archive {
        /// Archive file.
        path: PathBuf,
    },
    /// A plain directory.
    Directory {
        /// Directory containing `META-INF/`.
        root: PathBuf,
    },
}

impl Origin {
    /// Creates an archive origin.
    pub fn archive(path: impl Into<PathBuf>) -> Self {
        Self::Archive { path: path.into() }
    }

    /// Creates a directory origin.
    pub fn directory(root: impl Into<PathBuf>) -> Self {
        Self::Directory { root: root.into() }
    }

    /// Returns the archive file or directory root.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Archive { path } => path,
            Self::Directory { root } => root,
        }
    }

    /// Returns `true` for archive origins.
    #[must_use]
    pub fn is_archive(&self) -> bool {
        matches!(self, Self::Archive { .. })
    }

    /// Returns `true` if `path` carries an archive extension.
    #[must_use]
    pub fn looks_like_archive(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                ARCHIVE_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            })
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Archive { path } => write!(f, "archive:{}", path.display()),
            Self::Directory { root } => write!(f, "dir:{}", root.display()),
        }
    }
}
