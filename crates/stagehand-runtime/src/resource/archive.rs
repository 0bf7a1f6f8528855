//! Read-only access to `.zip` / `.jar` origins.
//!
//! The whole archive is read into memory once; entries are then listed
//! and decompressed from the buffer. Stored and deflated entries are
//! supported.

use super::ResourceError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::warn;

/// One archive member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Normalized entry name (`/`-separated, no leading slash).
    pub name: String,
    /// Directory marker entry.
    pub is_dir: bool,
}

/// An archive loaded into memory.
#[derive(Debug, Clone)]
pub struct Archive {
    path: PathBuf,
    buf: Vec<u8>,
}

impl Archive {
    /// Reads the archive at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Io`] if the file cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ResourceError> {
        let path = path.into();
        let buf = std::fs::read(&path).map_err(|e| ResourceError::io(&path, e))?;
        Ok(Self { path, buf })
    }

    /// Returns the archive file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lists all entries in central-directory order.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Archive`] if the archive is corrupt.
    pub fn entries(&self) -> Result<Vec<ArchiveEntry>, ResourceError> {
        let archive = rawzip::ZipArchive::from_slice(&self.buf)
            .map_err(|e| ResourceError::archive(&self.path, format!("{e:?}")))?;

        let mut out = Vec::new();
        for entry in archive.entries() {
            let entry =
                entry.map_err(|e| ResourceError::archive(&self.path, format!("{e:?}")))?;
            let name = entry
                .file_path()
                .try_normalize()
                .map_err(|e| ResourceError::archive(&self.path, format!("{e:?}")))?
                .as_ref()
                .to_string();
            out.push(ArchiveEntry {
                name,
                is_dir: entry.is_dir(),
            });
        }
        Ok(out)
    }

    /// Decompresses every file entry whose name satisfies `wanted`.
    ///
    /// The outer error means the archive could not be walked at all. A
    /// failure to decompress one entry is returned next to its name so
    /// that callers can carry on with the rest. Entries whose names cannot
    /// be normalized are logged and skipped; [`entries`](Self::entries)
    /// still rejects them.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Archive`] if the archive is corrupt.
    pub fn read_files(
        &self,
        wanted: impl Fn(&str) -> bool,
    ) -> Result<Vec<(String, Result<Vec<u8>, ResourceError>)>, ResourceError> {
        let archive = rawzip::ZipArchive::from_slice(&self.buf)
            .map_err(|e| ResourceError::archive(&self.path, format!("{e:?}")))?;

        let mut out = Vec::new();
        for entry in archive.entries() {
            let entry =
                entry.map_err(|e| ResourceError::archive(&self.path, format!("{e:?}")))?;
            if entry.is_dir() {
                continue;
            }
            let name = match entry.file_path().try_normalize() {
                Ok(name) => name.as_ref().to_string(),
                Err(e) => {
                    warn!(archive = %self.path.display(), error = ?e, "unreadable entry name skipped");
                    continue;
                }
            };
            if !wanted(&name) {
                continue;
            }

            let wayfinder = entry.wayfinder();
            let contents = match archive.get_entry(wayfinder) {
                Ok(slice_entry) => {
                    let data = slice_entry.data();
                    match entry.compression_method() {
                        rawzip::CompressionMethod::Store => Ok(data.to_vec()),
                        rawzip::CompressionMethod::Deflate => {
                            let mut decoded = Vec::new();
                            flate2::read::DeflateDecoder::new(data)
                                .read_to_end(&mut decoded)
                                .map(|_| decoded)
                                .map_err(|e| ResourceError::io(self.path.join(&name), e))
                        }
                        method => Err(ResourceError::UnsupportedCompression {
                            path: self.path.clone(),
                            entry: name.clone(),
                            method: format!("{method:?}"),
                        }),
                    }
                }
                Err(e) => Err(ResourceError::archive(&self.path, format!("{e:?}"))),
            };
            out.push((name, contents));
        }
        Ok(out)
    }

    /// Reads one file entry by exact name.
    ///
    /// Returns `Ok(None)` if there is no such entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive is corrupt or the entry cannot be
    /// decompressed.
    pub fn read(&self, name: &str) -> Result<Option<Vec<u8>>, ResourceError> {
        let name = name.trim_start_matches('/');
        match self.read_files(|n| n == name)?.into_iter().next() {
            Some((_, contents)) => contents.map(Some),
            None => Ok(None),
        }
    }

    /// Returns `true` if a file entry with this name exists.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Archive`] if the archive is corrupt.
    pub fn contains(&self, name: &str) -> Result<bool, ResourceError> {
        Ok(self
            .entries()?
            .iter()
            .any(|e| !e.is_dir && e.name == name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ArchiveBuilder;
    use tempfile::TempDir;

    #[test]
    fn lists_and_reads_entries() {
        let tmp = TempDir::new().expect("should create temp dir");
        let path = ArchiveBuilder::new()
            .file("META-INF/components-def.xml", "<components/>")
            .dir("webapp/")
            .file("webapp/a.html", "<h1>a</h1>")
            .write_to(tmp.path().join("a.jar"))
            .expect("should write archive");

        let archive = Archive::open(&path).expect("should open archive");
        let entries = archive.entries().expect("should list entries");
        assert_eq!(entries.len(), 3);
        assert!(entries.iter().any(|e| e.name == "webapp/" && e.is_dir));

        let html = archive
            .read("webapp/a.html")
            .expect("read should succeed")
            .expect("entry should exist");
        assert_eq!(html, b"<h1>a</h1>");
        assert!(archive.read("webapp/missing.html").expect("read ok").is_none());
        assert!(archive.contains("META-INF/components-def.xml").expect("list ok"));
    }

    #[test]
    fn read_files_filters_by_name() {
        let tmp = TempDir::new().expect("should create temp dir");
        let path = ArchiveBuilder::new()
            .file("webapp/a.html", "a")
            .file("webapp/js/b.js", "b")
            .file("other.txt", "x")
            .write_to(tmp.path().join("b.zip"))
            .expect("should write archive");

        let archive = Archive::open(&path).expect("should open archive");
        let files = archive
            .read_files(|n| n.starts_with("webapp/"))
            .expect("should read files");
        let names: Vec<_> = files.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["webapp/a.html", "webapp/js/b.js"]);
        assert!(files.iter().all(|(_, c)| c.is_ok()));
    }

    #[test]
    fn garbage_is_an_archive_error() {
        let tmp = TempDir::new().expect("should create temp dir");
        let path = tmp.path().join("bad.jar");
        std::fs::write(&path, b"not a zip at all").expect("should write file");

        let archive = Archive::open(&path).expect("open only reads bytes");
        assert!(matches!(
            archive.entries(),
            Err(ResourceError::Archive { .. })
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            Archive::open("/nonexistent/x.jar"),
            Err(ResourceError::Io { .. })
        ));
    }
}
