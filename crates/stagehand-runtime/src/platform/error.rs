//! Platform errors.
//!
//! Public platform operations never return these directly; they are
//! collected per step in an [`OperationReport`](super::OperationReport).

use crate::resource::ResourceError;
use crate::settings::SettingsError;
use stagehand_component::{DescriptorError, ListenerError};
use thiserror::Error;

/// Any failure the platform can record.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The operation named a code that is not registered.
    #[error("unknown component: {0}")]
    UnknownComponent(String),

    /// A descriptor document or entry was rejected.
    #[error("descriptor in {origin}: {source}")]
    Descriptor {
        /// Origin the document came from.
        origin: String,
        #[source]
        source: DescriptorError,
    },

    /// Listener resolution or a hook failed.
    #[error(transparent)]
    Listener(#[from] ListenerError),

    /// Origin access or materialization failed.
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// The settings store could not be saved.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// A persisted state value is neither `active` nor `disable`.
    #[error("component '{code}' has unrecognized persisted state '{value}'")]
    InvalidState {
        /// Component code.
        code: String,
        /// Raw persisted value.
        value: String,
    },
}

impl PlatformError {
    /// Creates a descriptor error for `origin`.
    pub fn descriptor(origin: impl ToString, source: DescriptorError) -> Self {
        Self::Descriptor {
            origin: origin.to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transparent_variants_keep_message() {
        let err = PlatformError::from(ListenerError::NotFound("crmListener".into()));
        assert_eq!(err.to_string(), "listener bean not found: crmListener");

        let err = PlatformError::descriptor(
            "dir:/c/crm",
            DescriptorError::missing_field("version", Some("crm")),
        );
        assert!(err.to_string().starts_with("descriptor in dir:/c/crm:"));
    }
}
