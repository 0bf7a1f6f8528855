//! Persistent settings and the component settings merger.
//!
//! One [`SettingsStore`] holds both component state keys
//! (`<namespace>.component.<code>.state`) and merged component settings.
//! A second store, the log status store, is loaded the same way but only
//! read.

mod error;
mod merge;
mod store;

pub use error::SettingsError;
pub use merge::{merge_settings, remove_settings, MergeOutcome};
pub use store::{parse_flat, SettingsStore};
