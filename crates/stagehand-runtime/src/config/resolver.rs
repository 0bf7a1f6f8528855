//! Configuration resolver trait for layered overrides.
//!
//! ```text
//! ConfigLoader.load()  →  StageConfig (base)
//!                              │
//!                              ▼
//!                     ConfigResolver.apply()
//!                              │
//!                              ▼
//!                     StageConfig (final)
//! ```

use super::StageConfig;

/// Trait for applying configuration overrides.
///
/// Implementors modify an already-loaded config with their own
/// overrides (CLI flags, programmatic settings).
///
/// # Example
///
/// ```
/// use stagehand_runtime::config::{ConfigResolver, StageConfig};
///
/// struct NoOverlay;
///
/// impl ConfigResolver for NoOverlay {
///     fn apply(&self, config: &mut StageConfig) {
///         config.resources.overlay = false;
///     }
/// }
///
/// let mut config = StageConfig::default();
/// NoOverlay.apply(&mut config);
/// assert!(!config.resources.overlay);
/// ```
pub trait ConfigResolver {
    /// Applies overrides to the given configuration.
    ///
    /// Only explicitly specified values should be applied, preserving
    /// existing values for unspecified options.
    fn apply(&self, config: &mut StageConfig);
}

/// Resolver that makes no changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpResolver;

impl ConfigResolver for NoOpResolver {
    fn apply(&self, _config: &mut StageConfig) {}
}
