//! Resource materialization.
//!
//! Copies the resource subtree of an origin into the destination root and
//! takes it back out on removal.
//!
//! ```text
//! origin (archive or dir)              destination root
//! ├── webapp/index.html      ──────►   ├── index.html
//! └── webapp/js/app.js       ──────►   └── js/app.js
//! ```
//!
//! All relative paths are validated before the first write. After that the
//! copy is best-effort: a failing file is recorded in the report and the
//! remaining files are still processed. Nothing is rolled back.

use super::containment::{contained_join, validate_relative};
use super::{Archive, ResourceError};
use crate::config::ResourcesConfig;
use stagehand_component::Origin;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Materialization policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializeOptions {
    /// Origin-relative subtree to copy.
    pub subtree: String,
    /// Overwrite existing destination files.
    pub overlay: bool,
    /// Lowercase extensions (no dot) never copied or deleted.
    pub excluded_extensions: Vec<String>,
    /// Delete directory-origin files on removal.
    pub retract_directory_resources: bool,
}

impl Default for MaterializeOptions {
    fn default() -> Self {
        Self::from(&ResourcesConfig::default())
    }
}

impl From<&ResourcesConfig> for MaterializeOptions {
    fn from(config: &ResourcesConfig) -> Self {
        Self {
            subtree: config.subtree.clone(),
            overlay: config.overlay,
            excluded_extensions: config
                .excluded_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
            retract_directory_resources: config.retract_directory_resources,
        }
    }
}

impl MaterializeOptions {
    fn is_excluded(&self, rel: &str) -> bool {
        Path::new(rel)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.excluded_extensions
                    .iter()
                    .any(|x| x.eq_ignore_ascii_case(ext))
            })
    }

    /// Subtree as an archive entry prefix, e.g. `webapp/`.
    fn prefix(&self) -> String {
        let trimmed = self.subtree.trim_matches('/');
        if trimmed.is_empty() || trimmed == "." {
            String::new()
        } else {
            format!("{trimmed}/")
        }
    }
}

/// Outcome of one deploy or remove pass.
///
/// Paths are destination paths.
#[derive(Debug, Default)]
pub struct MaterializeReport {
    /// Files written.
    pub written: Vec<PathBuf>,
    /// Files deleted.
    pub removed: Vec<PathBuf>,
    /// Files left alone (already present without overlay, or already gone).
    pub skipped: Vec<PathBuf>,
    /// Files filtered out by extension.
    pub excluded: Vec<PathBuf>,
    /// Per-file failures.
    pub failures: Vec<ResourceError>,
}

impl MaterializeReport {
    /// Returns `true` if no file failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Copies component resources into, and out of, a destination root.
#[derive(Debug, Clone, Default)]
pub struct ResourceMaterializer {
    options: MaterializeOptions,
}

impl ResourceMaterializer {
    /// Creates a materializer with the given policy.
    #[must_use]
    pub fn new(options: MaterializeOptions) -> Self {
        Self { options }
    }

    /// Returns the policy.
    #[must_use]
    pub fn options(&self) -> &MaterializeOptions {
        &self.options
    }

    /// Copies the origin's subtree into `destination`.
    ///
    /// A missing subtree is not an error and yields an empty report.
    ///
    /// # Errors
    ///
    /// Fails without writing anything if the subtree or any entry would
    /// escape its root, if the origin cannot be read, or (directory
    /// origins without overlay) if a destination file already exists.
    pub fn deploy_resources(
        &self,
        origin: &Origin,
        destination: &Path,
    ) -> Result<MaterializeReport, ResourceError> {
        validate_relative(Path::new(&self.options.subtree), origin.path())?;
        let report = match origin {
            Origin::Archive { path } => self.deploy_archive(path, destination)?,
            Origin::Directory { root } => self.deploy_directory(root, destination)?,
        };
        info!(
            origin = %origin,
            written = report.written.len(),
            skipped = report.skipped.len(),
            excluded = report.excluded.len(),
            failed = report.failures.len(),
            "resources deployed"
        );
        Ok(report)
    }

    /// Deletes the files a previous deploy of `origin` wrote.
    ///
    /// Directories are left in place. Directory origins are only retracted
    /// when `retract_directory_resources` is set; otherwise this is a no-op.
    ///
    /// # Errors
    ///
    /// Fails without deleting anything if a path would escape its root or
    /// the origin cannot be read.
    pub fn remove_resources(
        &self,
        origin: &Origin,
        destination: &Path,
    ) -> Result<MaterializeReport, ResourceError> {
        validate_relative(Path::new(&self.options.subtree), origin.path())?;
        let planned = match origin {
            Origin::Archive { path } => self.archive_plan(&Archive::open(path)?, destination)?,
            Origin::Directory { root } => {
                if !self.options.retract_directory_resources {
                    debug!(origin = %origin, "directory resources are not retracted");
                    return Ok(MaterializeReport::default());
                }
                self.directory_plan(root, destination)?
            }
        };

        let mut report = MaterializeReport::default();
        for item in planned.into_iter().filter(|p| !p.is_dir) {
            if self.options.is_excluded(&item.rel) {
                report.excluded.push(item.target);
                continue;
            }
            match std::fs::remove_file(&item.target) {
                Ok(()) => {
                    debug!(path = %item.target.display(), "removed");
                    report.removed.push(item.target);
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    report.skipped.push(item.target);
                }
                Err(e) => {
                    warn!(path = %item.target.display(), error = %e, "failed to remove resource");
                    report.failures.push(ResourceError::io(item.target, e));
                }
            }
        }
        info!(
            origin = %origin,
            removed = report.removed.len(),
            failed = report.failures.len(),
            "resources removed"
        );
        Ok(report)
    }

    fn deploy_archive(
        &self,
        path: &Path,
        destination: &Path,
    ) -> Result<MaterializeReport, ResourceError> {
        let archive = Archive::open(path)?;
        let planned = self.archive_plan(&archive, destination)?;
        let mut report = MaterializeReport::default();
        if planned.is_empty() {
            return Ok(report);
        }

        for dir in planned.iter().filter(|p| p.is_dir) {
            if let Err(e) = std::fs::create_dir_all(&dir.target) {
                report.failures.push(ResourceError::io(&dir.target, e));
            }
        }

        let prefix = self.options.prefix();
        let files = archive.read_files(|name| {
            name.strip_prefix(prefix.as_str())
                .is_some_and(|rel| !rel.is_empty())
        })?;
        let by_rel: HashMap<&str, &Planned> = planned
            .iter()
            .filter(|p| !p.is_dir)
            .map(|p| (p.rel.as_str(), p))
            .collect();
        for (name, contents) in files {
            let rel = &name[prefix.len()..];
            let Some(item) = by_rel.get(rel) else {
                continue;
            };
            if self.options.is_excluded(rel) {
                report.excluded.push(item.target.clone());
                continue;
            }
            match contents {
                Ok(bytes) => {
                    self.write_file(&item.target, |t| std::fs::write(t, &bytes), &mut report);
                }
                Err(e) => report.failures.push(e),
            }
        }
        Ok(report)
    }

    fn deploy_directory(
        &self,
        root: &Path,
        destination: &Path,
    ) -> Result<MaterializeReport, ResourceError> {
        let planned = self.directory_plan(root, destination)?;
        let mut report = MaterializeReport::default();

        if !self.options.overlay {
            if let Some(existing) = planned
                .iter()
                .find(|p| !p.is_dir && !self.options.is_excluded(&p.rel) && p.target.exists())
            {
                warn!(
                    path = %existing.target.display(),
                    "destination exists and overlay is off, not copying"
                );
                return Err(ResourceError::DestinationExists(existing.target.clone()));
            }
        }

        let source = root.join(&self.options.subtree);
        for item in planned {
            if item.is_dir {
                if let Err(e) = std::fs::create_dir_all(&item.target) {
                    report.failures.push(ResourceError::io(&item.target, e));
                }
                continue;
            }
            if self.options.is_excluded(&item.rel) {
                report.excluded.push(item.target);
                continue;
            }
            let src = source.join(&item.rel);
            self.write_file(
                &item.target,
                |t| std::fs::copy(&src, t).map(|_| ()),
                &mut report,
            );
        }
        Ok(report)
    }

    fn write_file(
        &self,
        target: &Path,
        write: impl FnOnce(&Path) -> std::io::Result<()>,
        report: &mut MaterializeReport,
    ) {
        if target.exists() && !self.options.overlay {
            debug!(path = %target.display(), "exists, skipped");
            report.skipped.push(target.to_path_buf());
            return;
        }
        if let Some(parent) = target.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!(path = %parent.display(), error = %e, "failed to create directory");
                report.failures.push(ResourceError::io(parent, e));
                return;
            }
        }
        match write(target) {
            Ok(()) => {
                debug!(path = %target.display(), "written");
                report.written.push(target.to_path_buf());
            }
            Err(e) => {
                warn!(path = %target.display(), error = %e, "failed to write resource");
                report.failures.push(ResourceError::io(target, e));
            }
        }
    }

    /// Maps every subtree entry to its destination, validating all of them.
    fn archive_plan(
        &self,
        archive: &Archive,
        destination: &Path,
    ) -> Result<Vec<Planned>, ResourceError> {
        let prefix = self.options.prefix();
        archive
            .entries()?
            .into_iter()
            .filter_map(|entry| {
                let rel = entry.name.strip_prefix(prefix.as_str())?;
                let rel = rel.trim_end_matches('/');
                (!rel.is_empty()).then(|| (rel.to_string(), entry.is_dir))
            })
            .map(|(rel, is_dir)| -> Result<Planned, ResourceError> {
                Ok(Planned {
                    target: contained_join(destination, &rel)?,
                    rel,
                    is_dir,
                })
            })
            .collect()
    }

    fn directory_plan(&self, root: &Path, destination: &Path) -> Result<Vec<Planned>, ResourceError> {
        let source = contained_join(root, &self.options.subtree)?;
        if !source.is_dir() {
            return Ok(Vec::new());
        }
        let mut planned = Vec::new();
        for entry in walkdir::WalkDir::new(&source)
            .follow_links(false)
            .sort_by_file_name()
            .min_depth(1)
        {
            let entry = entry?;
            let rel = entry
                .path()
                .strip_prefix(&source)
                .map_err(|_| ResourceError::escape(entry.path().display().to_string(), &source))?;
            let rel_str = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            planned.push(Planned {
                target: contained_join(destination, rel)?,
                rel: rel_str,
                is_dir: entry.file_type().is_dir(),
            });
        }
        Ok(planned)
    }
}

#[derive(Debug)]
struct Planned {
    rel: String,
    target: PathBuf,
    is_dir: bool,
}
