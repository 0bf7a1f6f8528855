//! Fixture builders for origins.
//!
//! - [`ArchiveBuilder`] writes small `.zip` / `.jar` files (stored or deflated entries).
//! - [`DirectoryOriginBuilder`] lays out a directory origin.
//! - [`descriptor_document`] renders descriptors back into a descriptor document.
//!
//! ```ignore
//! use stagehand_component::ComponentDescriptor;
//! use stagehand_runtime::testing::ArchiveBuilder;
//!
//! let crm = ComponentDescriptor::new("CRM", "crm", "1.0").with_entry_point("/crm/");
//! let jar = ArchiveBuilder::new()
//!     .descriptor(&[crm])
//!     .file("webapp/index.html", "<h1>crm</h1>")
//!     .write_to(dir.join("crm.jar"))?;
//! ```

use flate2::write::DeflateEncoder;
use flate2::Compression;
use rawzip::{CompressionMethod, ZipArchiveWriter, ZipDataWriter};
use stagehand_component::{ComponentDescriptor, Origin, DESCRIPTOR_PATH};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
struct PendingEntry {
    name: String,
    data: Vec<u8>,
    deflate: bool,
}

/// Builds a zip archive in memory and writes it to disk.
#[derive(Debug, Clone, Default)]
pub struct ArchiveBuilder {
    entries: Vec<PendingEntry>,
}

impl ArchiveBuilder {
    /// Creates an empty archive.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a stored file entry.
    #[must_use]
    pub fn file(mut self, name: impl Into<String>, contents: impl AsRef<[u8]>) -> Self {
        self.entries.push(PendingEntry {
            name: name.into(),
            data: contents.as_ref().to_vec(),
            deflate: false,
        });
        self
    }

    /// Adds a deflate-compressed file entry.
    #[must_use]
    pub fn deflated_file(mut self, name: impl Into<String>, contents: impl AsRef<[u8]>) -> Self {
        self.entries.push(PendingEntry {
            name: name.into(),
            data: contents.as_ref().to_vec(),
            deflate: true,
        });
        self
    }

    /// Adds a directory marker entry. A trailing `/` is appended if missing.
    #[must_use]
    pub fn dir(mut self, name: impl Into<String>) -> Self {
        let mut name = name.into();
        if !name.ends_with('/') {
            name.push('/');
        }
        self.entries.push(PendingEntry {
            name,
            data: Vec::new(),
            deflate: false,
        });
        self
    }

    /// Adds `META-INF/components-def.xml` declaring `components`.
    #[must_use]
    pub fn descriptor(self, components: &[ComponentDescriptor]) -> Self {
        self.file(DESCRIPTOR_PATH, descriptor_document(components))
    }

    /// Encodes the archive.
    ///
    /// # Errors
    ///
    /// Returns an error if an entry cannot be encoded.
    pub fn to_bytes(&self) -> std::io::Result<Vec<u8>> {
        let mut archive = ZipArchiveWriter::new(Vec::new());
        for entry in &self.entries {
            if entry.name.ends_with('/') {
                archive.new_dir(&entry.name).create().map_err(zip_error)?;
                continue;
            }
            let method = if entry.deflate {
                CompressionMethod::Deflate
            } else {
                CompressionMethod::Store
            };
            let mut file = archive
                .new_file(&entry.name)
                .compression_method(method)
                .create()
                .map_err(zip_error)?;
            let descriptor = if entry.deflate {
                let encoder = DeflateEncoder::new(&mut file, Compression::default());
                let mut writer = ZipDataWriter::new(encoder);
                writer.write_all(&entry.data)?;
                let (encoder, descriptor) = writer.finish().map_err(zip_error)?;
                encoder.finish()?;
                descriptor
            } else {
                let mut writer = ZipDataWriter::new(&mut file);
                writer.write_all(&entry.data)?;
                writer.finish().map_err(zip_error)?.1
            };
            file.finish(descriptor).map_err(zip_error)?;
        }
        archive.finish().map_err(zip_error)
    }

    /// Writes the archive to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be written.
    pub fn write_to(&self, path: impl Into<PathBuf>) -> std::io::Result<PathBuf> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, self.to_bytes()?)?;
        Ok(path)
    }
}

fn zip_error(e: rawzip::Error) -> std::io::Error {
    std::io::Error::other(e)
}

/// Lays out a directory origin on disk.
#[derive(Debug, Clone)]
pub struct DirectoryOriginBuilder {
    root: PathBuf,
    files: Vec<(String, Vec<u8>)>,
}

impl DirectoryOriginBuilder {
    /// Targets `root`; it is created by [`build`](Self::build).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            files: Vec::new(),
        }
    }

    /// Adds a file at an origin-relative path.
    #[must_use]
    pub fn file(mut self, rel: impl Into<String>, contents: impl AsRef<[u8]>) -> Self {
        self.files.push((rel.into(), contents.as_ref().to_vec()));
        self
    }

    /// Adds `META-INF/components-def.xml` declaring `components`.
    #[must_use]
    pub fn descriptor(self, components: &[ComponentDescriptor]) -> Self {
        self.file(DESCRIPTOR_PATH, descriptor_document(components))
    }

    /// Writes the files and returns the origin.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if a file cannot be written.
    pub fn build(self) -> std::io::Result<Origin> {
        std::fs::create_dir_all(&self.root)?;
        for (rel, contents) in &self.files {
            let path = self.root.join(Path::new(rel));
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, contents)?;
        }
        Ok(Origin::directory(self.root))
    }
}

/// Renders descriptors as a descriptor document.
///
/// An empty entry point is rendered as `/<code>/` so that fixtures built
/// with [`ComponentDescriptor::new`] alone still parse.
#[must_use]
pub fn descriptor_document(components: &[ComponentDescriptor]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<components>\n");
    for c in components {
        xml.push_str("  <component>\n");
        element(&mut xml, "name", &c.name);
        element(&mut xml, "code", &c.code);
        element(&mut xml, "version", &c.version);
        if let Some(d) = &c.description {
            element(&mut xml, "description", d);
        }
        if c.entry_point.is_empty() {
            element(&mut xml, "enter", &format!("/{}/", c.code));
        } else {
            element(&mut xml, "enter", &c.entry_point);
        }
        if !c.inline_config.is_empty() || c.config_file.is_some() {
            match &c.config_file {
                Some(f) => xml.push_str(&format!("    <config file=\"{}\">\n", escape(f))),
                None => xml.push_str("    <config>\n"),
            }
            for (k, v) in &c.inline_config {
                xml.push_str(&format!(
                    "      <item name=\"{}\">{}</item>\n",
                    escape(k),
                    escape(v)
                ));
            }
            xml.push_str("    </config>\n");
        }
        if let Some(l) = &c.listener {
            xml.push_str(&format!(
                "    <listener type=\"{}\">{}</listener>\n",
                l.kind,
                escape(&l.identifier)
            ));
        }
        if !c.properties.is_empty() {
            xml.push_str("    <properties>\n");
            for (k, v) in &c.properties {
                xml.push_str(&format!(
                    "      <property name=\"{}\">{}</property>\n",
                    escape(k),
                    escape(v)
                ));
            }
            xml.push_str("    </properties>\n");
        }
        xml.push_str("  </component>\n");
    }
    xml.push_str("</components>\n");
    xml
}

fn element(xml: &mut String, tag: &str, text: &str) {
    xml.push_str(&format!("    <{tag}>{}</{tag}>\n", escape(text)));
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagehand_component::{parse_descriptors, ListenerRef};

    #[test]
    fn descriptor_document_parses_back() {
        let crm = ComponentDescriptor::new("CRM & Co", "crm", "1.0")
            .with_entry_point("/crm/")
            .with_config_file("crm.toml")
            .with_inline_config("crm.size", "20")
            .with_property("group", "sales")
            .with_listener(ListenerRef::bean("crmListener"));

        let parsed = parse_descriptors(&descriptor_document(std::slice::from_ref(&crm)))
            .expect("rendered document should parse");
        let back = parsed
            .into_iter()
            .next()
            .expect("one entry")
            .expect("entry should be complete");
        assert_eq!(back, crm);
    }

    #[test]
    fn written_archive_reads_back() {
        let tmp = tempfile::tempdir().expect("should create temp dir");
        let jar = ArchiveBuilder::new()
            .dir("webapp/")
            .file("webapp/plain.txt", "stored")
            .deflated_file("webapp/packed.txt", "deflated ".repeat(64))
            .write_to(tmp.path().join("a.jar"))
            .expect("should write archive");

        let archive = crate::resource::Archive::open(&jar).expect("should open archive");
        let entries = archive.entries().expect("should list entries");
        assert_eq!(entries.len(), 3);
        assert_eq!(entries.iter().filter(|e| e.is_dir).count(), 1);
        assert_eq!(
            archive.read("webapp/plain.txt").expect("should read"),
            Some(b"stored".to_vec())
        );
        assert_eq!(
            archive.read("webapp/packed.txt").expect("should read"),
            Some("deflated ".repeat(64).into_bytes())
        );
    }
}
