//! Persistent key/value settings.
//!
//! The file is a flat TOML table of strings:
//!
//! ```toml
//! "stagehand.component.crm.state" = "active"
//! "crm.page-size" = "20"
//! ```
//!
//! Hand-edited files may use nested tables and non-string scalars; they are
//! flattened to dotted keys and stringified on load.

use super::SettingsError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Ordered key/value store, saved after every mutating call.
///
/// A store without a path (see [`SettingsStore::in_memory`]) never touches
/// the filesystem.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsStore {
    path: Option<PathBuf>,
    entries: BTreeMap<String, String>,
}

impl SettingsStore {
    /// Creates an empty store that is never persisted.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Loads the store at `path`. A missing file yields an empty store
    /// bound to that path.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] if the file exists but cannot be read or parsed.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();
        let entries = if path.exists() {
            let text = std::fs::read_to_string(&path).map_err(|e| SettingsError::read(&path, e))?;
            parse_flat(&text).map_err(|e| SettingsError::parse(&path, e))?
        } else {
            BTreeMap::new()
        };
        debug!(path = %path.display(), keys = entries.len(), "settings loaded");
        Ok(Self {
            path: Some(path),
            entries,
        })
    }

    /// Loads the store, falling back to an empty one on any error.
    ///
    /// The fallback stays bound to `path`, so the next write replaces the
    /// unreadable file.
    pub fn open_or_default(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match Self::load(&path) {
            Ok(store) => store,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "settings unreadable, starting empty");
                Self {
                    path: Some(path),
                    entries: BTreeMap::new(),
                }
            }
        }
    }

    /// Returns the backing file, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns the value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Returns `true` if `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns an owned copy of all entries.
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.entries.clone()
    }

    /// Sets one key and saves.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] if saving fails. The in-memory value is kept.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<(), SettingsError> {
        self.entries.insert(key.into(), value.into());
        self.save()
    }

    /// Removes one key and saves. Returns the previous value.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] if saving fails.
    pub fn remove(&mut self, key: &str) -> Result<Option<String>, SettingsError> {
        let old = self.entries.remove(key);
        if old.is_some() {
            self.save()?;
        }
        Ok(old)
    }

    /// Overwrites every key in `values` and saves once.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] if saving fails.
    pub fn overwrite_from<'a, I>(&mut self, values: I) -> Result<usize, SettingsError>
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let mut n = 0;
        for (k, v) in values {
            self.entries.insert(k.clone(), v.clone());
            n += 1;
        }
        self.save()?;
        Ok(n)
    }

    /// Adds keys not yet present and saves once.
    ///
    /// Returns `(added, kept)`: how many keys were new and how many were
    /// left untouched because they already existed.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] if saving fails.
    pub fn insert_missing<'a, I>(&mut self, values: I) -> Result<(usize, usize), SettingsError>
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let (mut added, mut kept) = (0, 0);
        for (k, v) in values {
            if self.entries.contains_key(k) {
                kept += 1;
            } else {
                self.entries.insert(k.clone(), v.clone());
                added += 1;
            }
        }
        if added > 0 {
            self.save()?;
        }
        Ok((added, kept))
    }

    /// Removes every listed key and saves once. Returns how many existed.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] if saving fails.
    pub fn remove_all<'a, I>(&mut self, keys: I) -> Result<usize, SettingsError>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let removed = keys
            .into_iter()
            .filter(|k| self.entries.remove(k.as_str()).is_some())
            .count();
        if removed > 0 {
            self.save()?;
        }
        Ok(removed)
    }

    /// Writes the store to its file (temp file, then rename).
    ///
    /// No-op for in-memory stores.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] if serialization or I/O fails.
    pub fn save(&self) -> Result<(), SettingsError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| SettingsError::write(parent, e))?;
        }
        let text = toml::to_string(&self.entries)?;
        let temp = temp_path(path);
        std::fs::write(&temp, text).map_err(|e| SettingsError::write(&temp, e))?;
        std::fs::rename(&temp, path).map_err(|e| SettingsError::write(path, e))?;
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "settings".into());
    path.with_file_name(format!(".{name}.tmp"))
}

/// Parses TOML text into flat string pairs.
///
/// # Errors
///
/// Returns the TOML parse error.
pub fn parse_flat(text: &str) -> Result<BTreeMap<String, String>, toml::de::Error> {
    let table: toml::Table = toml::from_str(text)?;
    let mut out = BTreeMap::new();
    flatten_into(&mut out, "", &table);
    Ok(out)
}

fn flatten_into(out: &mut BTreeMap<String, String>, prefix: &str, table: &toml::Table) {
    for (key, value) in table {
        let full = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            toml::Value::Table(inner) => flatten_into(out, &full, inner),
            toml::Value::String(s) => {
                out.insert(full, s.clone());
            }
            toml::Value::Array(items) => {
                let joined = items
                    .iter()
                    .map(|v| match v {
                        toml::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(",");
                out.insert(full, joined);
            }
            other => {
                out.insert(full, other.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn flatten_nested_and_scalars() {
        let flat = parse_flat(
            r#"
"stagehand.component.crm.state" = "active"
plain = "x"
count = 3
enabled = true
tags = ["a", "b"]

[crm]
page-size = 20
theme = "dark"
"#,
        )
        .expect("valid toml");

        assert_eq!(flat["stagehand.component.crm.state"], "active");
        assert_eq!(flat["plain"], "x");
        assert_eq!(flat["count"], "3");
        assert_eq!(flat["enabled"], "true");
        assert_eq!(flat["tags"], "a,b");
        assert_eq!(flat["crm.page-size"], "20");
        assert_eq!(flat["crm.theme"], "dark");
    }

    #[test]
    fn set_persists_immediately() {
        let tmp = TempDir::new().expect("should create temp dir");
        let path = tmp.path().join("conf/settings.toml");

        let mut store = SettingsStore::load(&path).expect("missing file is empty");
        assert!(store.is_empty());
        store
            .set("stagehand.component.crm.state", "disable")
            .expect("set should save");

        let reloaded = SettingsStore::load(&path).expect("should reload");
        assert_eq!(reloaded.get("stagehand.component.crm.state"), Some("disable"));
        assert!(!tmp.path().join("conf/.settings.toml.tmp").exists());
    }

    #[test]
    fn remove_clears_key_entirely() {
        let tmp = TempDir::new().expect("should create temp dir");
        let path = tmp.path().join("settings.toml");
        let mut store = SettingsStore::load(&path).expect("empty");
        store.set("k", "v").expect("set");

        assert_eq!(store.remove("k").expect("remove"), Some("v".into()));
        assert_eq!(store.remove("k").expect("remove"), None);
        let reloaded = SettingsStore::load(&path).expect("reload");
        assert!(!reloaded.contains_key("k"));
    }

    #[test]
    fn insert_missing_is_first_wins() {
        let mut store = SettingsStore::in_memory();
        store.set("k1", "old").expect("in-memory set");

        let incoming: BTreeMap<String, String> = [("k1", "new"), ("k2", "v2")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let (added, kept) = store.insert_missing(&incoming).expect("merge");

        assert_eq!((added, kept), (1, 1));
        assert_eq!(store.get("k1"), Some("old"));
        assert_eq!(store.get("k2"), Some("v2"));
    }

    #[test]
    fn overwrite_from_replaces() {
        let mut store = SettingsStore::in_memory();
        store.set("k1", "old").expect("in-memory set");
        let incoming: BTreeMap<String, String> =
            [("k1".to_string(), "new".to_string())].into_iter().collect();

        assert_eq!(store.overwrite_from(&incoming).expect("overwrite"), 1);
        assert_eq!(store.get("k1"), Some("new"));
    }

    #[test]
    fn corrupt_file_falls_back_to_empty() {
        let tmp = TempDir::new().expect("should create temp dir");
        let path = tmp.path().join("settings.toml");
        std::fs::write(&path, "this is = = not toml").expect("write fixture");

        assert!(matches!(
            SettingsStore::load(&path),
            Err(SettingsError::Parse { .. })
        ));
        let store = SettingsStore::open_or_default(&path);
        assert!(store.is_empty());
        assert_eq!(store.path(), Some(path.as_path()));
    }

    #[test]
    fn dotted_keys_survive_roundtrip() {
        let tmp = TempDir::new().expect("should create temp dir");
        let path = tmp.path().join("settings.toml");
        let mut store = SettingsStore::load(&path).expect("empty");
        store.set("a.b.c", "1").expect("set");
        store.set("a.b", "2").expect("set");

        let reloaded = SettingsStore::load(&path).expect("reload");
        assert_eq!(reloaded.get("a.b.c"), Some("1"));
        assert_eq!(reloaded.get("a.b"), Some("2"));
    }
}
