//! Runtime for stagehand.
//!
//! Discovers components in archive and directory origins, tracks their
//! enable state in a persistent settings store, merges their configuration
//! and materializes their `webapp/` resources under a web root.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Platform                            │
//! │  refresh · activate · disable · deploy · remove · start     │
//! └──┬──────────────┬───────────────┬──────────────┬────────────┘
//!    │              │               │              │
//!    ▼              ▼               ▼              ▼
//! discovery     listener        settings       resource
//! (origins)     (hooks)         (merge/store)  (materializer)
//! ```
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Layered configuration (defaults, global, project, env) |
//! | [`discovery`] | Origin providers |
//! | [`listener`] | Listener resolution and hook dispatch |
//! | [`settings`] | Persistent key/value store and config merge |
//! | [`resource`] | Archive reading, containment, materialization |
//! | [`platform`] | The orchestrator |
//!
//! # Example
//!
//! ```no_run
//! use stagehand_runtime::config::ConfigLoader;
//! use stagehand_runtime::Platform;
//! use std::path::Path;
//!
//! let root = Path::new("/srv/app");
//! let config = ConfigLoader::new()
//!     .with_project_root(root)
//!     .load()
//!     .expect("valid config")
//!     .resolved(root);
//!
//! let mut platform = Platform::builder(config).build();
//! if let Some(report) = platform.start() {
//!     for e in report.all_errors() {
//!         eprintln!("{e}");
//!     }
//! }
//! platform.disable("crm");
//! ```

pub mod config;
pub mod discovery;
pub mod listener;
pub mod platform;
pub mod resource;
pub mod settings;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use platform::{
    Operation, OperationReport, Outcome, Platform, PlatformBuilder, PlatformError, RefreshReport,
    Step, StepError,
};
