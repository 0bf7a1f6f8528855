//! Configuration types.
//!
//! All types implement [`Default`] for compile-time fallback values.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure.
///
/// This is the unified configuration after merging all layers.
///
/// # Example
///
/// ```
/// use stagehand_runtime::config::StageConfig;
///
/// let config = StageConfig::default();
/// assert_eq!(config.namespace, "stagehand");
/// assert!(config.resources.overlay);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StageConfig {
    /// Enable debug mode (verbose logging).
    pub debug: bool,

    /// Prefix of persisted state keys: `<namespace>.component.<code>.state`.
    pub namespace: String,

    /// Export loaded settings to the process environment at construction.
    pub export_env: bool,

    /// Path configuration.
    pub paths: PathsConfig,

    /// Resource materialization configuration.
    pub resources: ResourcesConfig,

    /// Origin discovery configuration.
    pub discovery: DiscoveryConfig,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            debug: false,
            namespace: "stagehand".into(),
            export_env: true,
            paths: PathsConfig::default(),
            resources: ResourcesConfig::default(),
            discovery: DiscoveryConfig::default(),
        }
    }
}

impl StageConfig {
    /// Creates a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes to TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Deserializes from TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if deserialization fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Merges another config into this one.
    ///
    /// Values from `other` override values in `self` only if they
    /// differ from the default. This enables layered configuration.
    pub fn merge(&mut self, other: &Self) {
        let default = Self::default();

        if other.debug != default.debug {
            self.debug = other.debug;
        }
        if other.namespace != default.namespace {
            self.namespace = other.namespace.clone();
        }
        if other.export_env != default.export_env {
            self.export_env = other.export_env;
        }

        self.paths.merge(&other.paths);
        self.resources.merge(&other.resources);
        self.discovery.merge(&other.discovery);
    }

    /// Returns a copy whose relative paths are anchored at `root`.
    #[must_use]
    pub fn resolved(&self, root: &Path) -> Self {
        let mut out = self.clone();
        out.paths = self.paths.resolved(root);
        out
    }
}

/// Path configuration.
///
/// Relative paths are interpreted against the project root
/// (see [`StageConfig::resolved`]).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PathsConfig {
    /// Persistent settings store.
    pub settings_file: PathBuf,

    /// Read-only log status store.
    pub log_status_file: PathBuf,

    /// Destination root for materialized resources.
    pub webroot: PathBuf,

    /// Roots scanned for component origins.
    pub origins: Vec<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            settings_file: PathBuf::from(".stagehand/settings.toml"),
            log_status_file: PathBuf::from(".stagehand/log-status.toml"),
            webroot: PathBuf::from("webroot"),
            origins: vec![PathBuf::from("components")],
        }
    }
}

impl PathsConfig {
    fn merge(&mut self, other: &Self) {
        let default = Self::default();

        if other.settings_file != default.settings_file {
            self.settings_file = other.settings_file.clone();
        }
        if other.log_status_file != default.log_status_file {
            self.log_status_file = other.log_status_file.clone();
        }
        if other.webroot != default.webroot {
            self.webroot = other.webroot.clone();
        }
        if other.origins != default.origins {
            self.origins = other.origins.clone();
        }
    }

    fn resolved(&self, root: &Path) -> Self {
        let anchor = |p: &Path| {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                root.join(p)
            }
        };
        Self {
            settings_file: anchor(&self.settings_file),
            log_status_file: anchor(&self.log_status_file),
            webroot: anchor(&self.webroot),
            origins: self.origins.iter().map(|p| anchor(p)).collect(),
        }
    }
}

/// Resource materialization configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResourcesConfig {
    /// Origin-relative subtree holding the component's resources.
    pub subtree: String,

    /// Overwrite existing destination files.
    pub overlay: bool,

    /// File extensions never materialized (no leading dot, case-insensitive).
    pub excluded_extensions: Vec<String>,

    /// Delete materialized files of directory origins on removal.
    pub retract_directory_resources: bool,
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            subtree: "webapp".into(),
            overlay: true,
            excluded_extensions: Vec::new(),
            retract_directory_resources: false,
        }
    }
}

impl ResourcesConfig {
    fn merge(&mut self, other: &Self) {
        let default = Self::default();

        if other.subtree != default.subtree {
            self.subtree = other.subtree.clone();
        }
        if other.overlay != default.overlay {
            self.overlay = other.overlay;
        }
        if !other.excluded_extensions.is_empty() {
            self.excluded_extensions = other.excluded_extensions.clone();
        }
        if other.retract_directory_resources != default.retract_directory_resources {
            self.retract_directory_resources = other.retract_directory_resources;
        }
    }
}

/// Origin discovery configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Maximum directory depth below each origin root.
    pub max_depth: usize,

    /// Follow symbolic links while scanning.
    pub follow_links: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_depth: 2,
            follow_links: false,
        }
    }
}

impl DiscoveryConfig {
    fn merge(&mut self, other: &Self) {
        let default = Self::default();

        if other.max_depth != default.max_depth {
            self.max_depth = other.max_depth;
        }
        if other.follow_links != default.follow_links {
            self.follow_links = other.follow_links;
        }
    }
}
