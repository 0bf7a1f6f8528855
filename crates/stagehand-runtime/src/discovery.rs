//! Origin discovery.
//!
//! The platform asks every [`OriginProvider`] for candidate origins on each
//! refresh. Reading the descriptor document out of a candidate is the
//! platform's job; providers only locate.
//!
//! ```text
//! components/                      DirectoryScanProvider root
//! ├── crm-1.2.0.jar                → Origin::Archive
//! ├── reports/                     → Origin::Directory
//! │   ├── META-INF/components-def.xml
//! │   └── webapp/...
//! └── notes.txt                    (ignored)
//! ```

use crate::resource::ResourceError;
use stagehand_component::{Origin, DESCRIPTOR_DIR, DESCRIPTOR_FILE};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Source of candidate origins.
pub trait OriginProvider: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str;

    /// Returns candidate origins in a stable order.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError`] if the provider cannot enumerate at all.
    fn origins(&self) -> Result<Vec<Origin>, ResourceError>;
}

/// Walks directory roots for archives and descriptor-bearing directories.
///
/// Depth is counted from each root (the root itself is depth 0). Missing
/// roots are skipped.
#[derive(Debug, Clone)]
pub struct DirectoryScanProvider {
    roots: Vec<PathBuf>,
    max_depth: usize,
    follow_links: bool,
}

impl DirectoryScanProvider {
    /// Creates a provider over `roots` with a default depth of 2.
    pub fn new(roots: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
            max_depth: 2,
            follow_links: false,
        }
    }

    /// Sets the maximum origin depth below each root.
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Follows symbolic links while scanning.
    #[must_use]
    pub fn follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    /// Returns the scanned roots.
    #[must_use]
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    fn scan_root(&self, root: &std::path::Path, out: &mut Vec<Origin>) {
        if root.is_file() {
            if Origin::looks_like_archive(root) {
                out.push(Origin::archive(root));
            }
            return;
        }
        if !root.is_dir() {
            debug!(root = %root.display(), "origin root does not exist");
            return;
        }

        // Descriptor files sit two levels below their origin directory.
        for entry in walkdir::WalkDir::new(root)
            .follow_links(self.follow_links)
            .max_depth(self.max_depth + 2)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!(root = %root.display(), error = %e, "skipping unreadable path");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if entry.depth() <= self.max_depth && Origin::looks_like_archive(path) {
                out.push(Origin::archive(path));
                continue;
            }
            if entry.file_name() == DESCRIPTOR_FILE {
                let meta = path.parent();
                let is_meta_inf = meta
                    .and_then(|m| m.file_name())
                    .is_some_and(|n| n == DESCRIPTOR_DIR);
                if let (true, Some(dir)) = (is_meta_inf, meta.and_then(|m| m.parent())) {
                    out.push(Origin::directory(dir));
                }
            }
        }
    }
}

impl OriginProvider for DirectoryScanProvider {
    fn name(&self) -> &str {
        "directory-scan"
    }

    fn origins(&self) -> Result<Vec<Origin>, ResourceError> {
        let mut out = Vec::new();
        for root in &self.roots {
            self.scan_root(root, &mut out);
        }
        let mut seen = std::collections::HashSet::new();
        out.retain(|o| seen.insert(o.clone()));
        debug!(count = out.len(), "origins discovered");
        Ok(out)
    }
}

/// A fixed list of origins.
#[derive(Debug, Clone, Default)]
pub struct StaticOrigins {
    origins: Vec<Origin>,
}

impl StaticOrigins {
    /// Wraps `origins`.
    pub fn new(origins: impl IntoIterator<Item = Origin>) -> Self {
        Self {
            origins: origins.into_iter().collect(),
        }
    }
}

impl OriginProvider for StaticOrigins {
    fn name(&self) -> &str {
        "static"
    }

    fn origins(&self) -> Result<Vec<Origin>, ResourceError> {
        Ok(self.origins.clone())
    }
}
