//! Component enable state.
//!
//! The state is never read from a descriptor document. It is restored
//! from the persisted settings store or produced by the deploy/activate
//! sequence.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Persisted literal for [`ComponentState::Active`].
pub const STATE_ACTIVE: &str = "active";

/// Persisted literal for [`ComponentState::Disabled`].
pub const STATE_DISABLED: &str = "disable";

/// Enable state of a registered component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentState {
    /// Activated; receives `on_startup` on every reconciliation pass.
    Active,
    /// Deployed but not activated.
    #[default]
    Disabled,
}

impl ComponentState {
    /// Returns the literal written to the settings store.
    #[must_use]
    pub fn as_persisted(&self) -> &'static str {
        match self {
            Self::Active => STATE_ACTIVE,
            Self::Disabled => STATE_DISABLED,
        }
    }

    /// Parses a persisted literal.
    ///
    /// Returns `None` for anything other than `"active"` / `"disable"`.
    #[must_use]
    pub fn from_persisted(value: &str) -> Option<Self> {
        match value.trim() {
            STATE_ACTIVE => Some(Self::Active),
            STATE_DISABLED => Some(Self::Disabled),
            _ => None,
        }
    }

    /// Returns `true` if active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for ComponentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_persisted())
    }
}

/// Builds the settings key holding a component's persisted state.
///
/// Format: `<namespace>.component.<code>.state`.
#[must_use]
pub fn state_key(namespace: &str, code: &str) -> String {
    format!("{namespace}.component.{code}.state")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persisted_literals() {
        assert_eq!(ComponentState::Active.as_persisted(), "active");
        assert_eq!(ComponentState::Disabled.as_persisted(), "disable");
        assert_eq!(
            ComponentState::from_persisted(" active "),
            Some(ComponentState::Active)
        );
        assert_eq!(
            ComponentState::from_persisted("disable"),
            Some(ComponentState::Disabled)
        );
        assert_eq!(ComponentState::from_persisted("disabled"), None);
    }

    #[test]
    fn default_is_disabled() {
        assert_eq!(ComponentState::default(), ComponentState::Disabled);
        assert!(!ComponentState::default().is_active());
    }

    #[test]
    fn state_key_format() {
        assert_eq!(state_key("stagehand", "crm"), "stagehand.component.crm.state");
    }
}
