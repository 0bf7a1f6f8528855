//! Component configuration merge.
//!
//! | Source | Merge policy | Reversible on remove |
//! |--------|--------------|----------------------|
//! | `config_file` (resolved in the origin) | overwrite | yes, keys re-read from the file |
//! | `inline_config` | first-wins | no |
//!
//! When `config_file` is set but cannot be resolved, the inline items are
//! used instead.

use super::{parse_flat, SettingsError, SettingsStore};
use crate::resource::read_origin_file;
use stagehand_component::ComponentDescriptor;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// What [`merge_settings`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Keys from the config file overwrote the store.
    Overwritten {
        /// Keys written.
        keys: usize,
    },
    /// Inline items were merged first-wins.
    Inserted {
        /// Keys newly added.
        added: usize,
        /// Keys already present and left untouched.
        kept: usize,
    },
    /// Nothing to merge.
    Nothing,
}

/// Merges a component's configuration into `store`.
///
/// # Errors
///
/// Returns [`SettingsError`] only if saving the store fails. An
/// unresolvable config file is logged and falls back to inline items.
pub fn merge_settings(
    descriptor: &ComponentDescriptor,
    store: &mut SettingsStore,
) -> Result<MergeOutcome, SettingsError> {
    if descriptor.has_config_file() {
        if let Some(values) = load_config_file(descriptor) {
            let keys = store.overwrite_from(&values)?;
            debug!(code = %descriptor.code, keys, "config file merged");
            return Ok(MergeOutcome::Overwritten { keys });
        }
    }
    if descriptor.inline_config.is_empty() {
        return Ok(MergeOutcome::Nothing);
    }
    let (added, kept) = store.insert_missing(&descriptor.inline_config)?;
    debug!(code = %descriptor.code, added, kept, "inline config merged");
    Ok(MergeOutcome::Inserted { added, kept })
}

/// Removes the keys a config-file merge added.
///
/// Requires both `config_file` and `origin`; otherwise nothing is removed.
/// Inline items are never removed. Returns the number of keys cleared.
///
/// # Errors
///
/// Returns [`SettingsError`] only if saving the store fails.
pub fn remove_settings(
    descriptor: &ComponentDescriptor,
    store: &mut SettingsStore,
) -> Result<usize, SettingsError> {
    if !descriptor.has_config_file() || descriptor.origin.is_none() {
        return Ok(0);
    }
    let Some(values) = load_config_file(descriptor) else {
        return Ok(0);
    };
    let removed = store.remove_all(values.keys())?;
    debug!(code = %descriptor.code, removed, "config file keys removed");
    Ok(removed)
}

/// Loads `config_file` from the descriptor's origin, logging why it
/// could not be resolved.
fn load_config_file(descriptor: &ComponentDescriptor) -> Option<BTreeMap<String, String>> {
    let file = descriptor.config_file.as_deref()?.trim();
    let Some(origin) = &descriptor.origin else {
        warn!(code = %descriptor.code, file, "config file declared but component has no origin");
        return None;
    };
    let bytes = match read_origin_file(origin, file) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => {
            warn!(code = %descriptor.code, file, origin = %origin, "config file not found");
            return None;
        }
        Err(e) => {
            warn!(code = %descriptor.code, file, error = %e, "config file unreadable");
            return None;
        }
    };
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            warn!(code = %descriptor.code, file, error = %e, "config file is not UTF-8");
            return None;
        }
    };
    match parse_flat(&text) {
        Ok(values) => Some(values),
        Err(e) => {
            warn!(code = %descriptor.code, file, error = %e, "config file unparsable");
            None
        }
    }
}
