//! Configuration management with hierarchical layering.
//!
//! # Architecture
//!
//! Configuration is loaded from multiple sources with priority-based merging:
//!
//! ```text
//! Priority (highest to lowest):
//!
//! ┌──────────────────────────────────────────────┐
//! │  1. ConfigResolver (CLI flags)               │  Invocation override
//! ├──────────────────────────────────────────────┤
//! │  2. Environment Variables (STAGEHAND_*)      │  Runtime override
//! ├──────────────────────────────────────────────┤
//! │  3. Project Config (.stagehand/config.toml)  │  Project-specific
//! ├──────────────────────────────────────────────┤
//! │  4. Global Config ($STAGEHAND_HOME)          │  User defaults
//! ├──────────────────────────────────────────────┤
//! │  5. Default Values (compile-time)            │  Fallback
//! └──────────────────────────────────────────────┘
//! ```
//!
//! # Directory Structure
//!
//! ```text
//! ~/.stagehand/                 # Global directory (or $STAGEHAND_HOME)
//! └── config.toml               # Global configuration
//!
//! <project>/
//! ├── .stagehand/
//! │   ├── config.toml           # Project configuration (overrides global)
//! │   ├── settings.toml         # Persistent settings store (state keys + merged settings)
//! │   └── log-status.toml       # Log status store (read-only)
//! ├── components/               # Default discovery root
//! └── webroot/                  # Default resource destination
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Config Field | Type |
//! |----------|--------------|------|
//! | `STAGEHAND_DEBUG` | `debug` | bool |
//! | `STAGEHAND_NAMESPACE` | `namespace` | String |
//! | `STAGEHAND_EXPORT_ENV` | `export_env` | bool |
//! | `STAGEHAND_WEBROOT` | `paths.webroot` | PathBuf |
//! | `STAGEHAND_SETTINGS` | `paths.settings_file` | PathBuf |
//! | `STAGEHAND_OVERLAY` | `resources.overlay` | bool |
//!
//! # Example Configuration
//!
//! ```toml
//! namespace = "acme"
//!
//! [paths]
//! webroot = "public"
//! origins = ["components", "vendor/components"]
//!
//! [resources]
//! overlay = true
//! excluded_extensions = ["md", "map"]
//!
//! [discovery]
//! max_depth = 3
//! ```

mod error;
mod loader;
mod resolver;
mod types;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use resolver::{ConfigResolver, NoOpResolver};
pub use types::{DiscoveryConfig, PathsConfig, ResourcesConfig, StageConfig};

/// Environment variable overriding the global config directory.
pub const HOME_ENV: &str = "STAGEHAND_HOME";

/// Default global config directory.
///
/// `$STAGEHAND_HOME` when set, otherwise `~/.stagehand`.
pub fn default_config_dir() -> std::path::PathBuf {
    if let Some(home) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return std::path::PathBuf::from(home);
    }
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".stagehand")
}

/// Default global config file path.
pub fn default_config_path() -> std::path::PathBuf {
    default_config_dir().join("config.toml")
}

/// Project-local config directory name.
pub const PROJECT_CONFIG_DIR: &str = ".stagehand";

/// Project-local config file name.
pub const PROJECT_CONFIG_FILE: &str = "config.toml";
