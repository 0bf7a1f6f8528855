//! Component layer errors.
//!
//! | Error | Raised by | Effect |
//! |-------|-----------|--------|
//! | [`DescriptorError`] | descriptor parsing | entry (or whole document) skipped |
//! | [`ListenerError`] | listener resolution / hook dispatch | logged, recorded in reports |
//! | [`HookError`] | a listener hook | wrapped into [`ListenerError::HookFailed`] |

use crate::LifecycleEvent;
use thiserror::Error;

/// Errors raised while reading a descriptor document.
#[derive(Debug, Error)]
pub enum DescriptorError {
    /// The document itself could not be parsed.
    #[error("malformed descriptor document: {0}")]
    Malformed(#[from] roxmltree::Error),

    /// A required child element is absent or blank.
    #[error("component descriptor is missing required field '{field}'{}", at_code(.code))]
    MissingField {
        /// Element name (`name`, `code`, `version`, `enter`).
        field: &'static str,
        /// Code of the offending entry, when it was readable.
        code: Option<String>,
    },

    /// `listener@type` holds a value that maps to no resolution strategy.
    #[error("unknown listener type '{0}'")]
    UnknownListenerKind(String),
}

fn at_code(code: &Option<String>) -> String {
    match code {
        Some(c) => format!(" (component '{c}')"),
        None => String::new(),
    }
}

impl DescriptorError {
    /// Creates a missing field error.
    pub fn missing_field(field: &'static str, code: Option<&str>) -> Self {
        Self::MissingField {
            field,
            code: code.map(str::to_string),
        }
    }
}

/// Failure reported by a listener hook.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HookError {
    message: String,
}

impl HookError {
    /// Creates a hook error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors raised while resolving or invoking a component listener.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListenerError {
    /// No registry entry exists under the requested name.
    #[error("listener bean not found: {0}")]
    NotFound(String),

    /// The native type is unknown or its constructor failed.
    #[error("failed to instantiate listener '{identifier}': {message}")]
    InstantiationFailed {
        /// Requested type identifier.
        identifier: String,
        /// Constructor failure detail.
        message: String,
    },

    /// A hook returned an error.
    #[error("listener hook {event} failed for component '{code}': {source}")]
    HookFailed {
        /// Component whose listener failed.
        code: String,
        /// Hook that failed.
        event: LifecycleEvent,
        /// Error raised by the hook.
        #[source]
        source: HookError,
    },
}

impl ListenerError {
    /// Creates an instantiation error.
    pub fn instantiation(identifier: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InstantiationFailed {
            identifier: identifier.into(),
            message: message.into(),
        }
    }

    /// Creates a hook failure error.
    pub fn hook_failed(code: impl Into<String>, event: LifecycleEvent, source: HookError) -> Self {
        Self::HookFailed {
            code: code.into(),
            event,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_mentions_code_when_known() {
        let err = DescriptorError::missing_field("version", Some("crm"));
        assert_eq!(
            err.to_string(),
            "component descriptor is missing required field 'version' (component 'crm')"
        );

        let err = DescriptorError::missing_field("code", None);
        assert_eq!(
            err.to_string(),
            "component descriptor is missing required field 'code'"
        );
    }

    #[test]
    fn hook_failed_display() {
        let err = ListenerError::hook_failed(
            "crm",
            LifecycleEvent::BeforeActive,
            HookError::new("database offline"),
        );
        assert_eq!(
            err.to_string(),
            "listener hook before_active failed for component 'crm': database offline"
        );
    }
}
