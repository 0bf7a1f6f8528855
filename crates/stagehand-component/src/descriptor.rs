//! In-memory component descriptor.

use crate::{state_key, ComponentState, DescriptorError, Origin};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// How a declared listener is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListenerKind {
    /// Construct a registered native type by identifier.
    NativeClass,
    /// Look up a named shared instance.
    RegistryBean,
}

impl ListenerKind {
    /// Returns the canonical descriptor spelling.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NativeClass => "javabean",
            Self::RegistryBean => "spring",
        }
    }
}

impl FromStr for ListenerKind {
    type Err = DescriptorError;

    /// Accepts the legacy spellings (`javabean`, `spring`) and the
    /// descriptive ones (`native`, `bean`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "javabean" | "native" => Ok(Self::NativeClass),
            "spring" | "bean" => Ok(Self::RegistryBean),
            other => Err(DescriptorError::UnknownListenerKind(other.to_string())),
        }
    }
}

impl fmt::Display for ListenerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared listener reference: `(kind, identifier)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerRef {
    /// Resolution strategy.
    pub kind: ListenerKind,
    /// Type id or bean name.
    pub identifier: String,
}

impl ListenerRef {
    /// References a native type by id.
    pub fn native(identifier: impl Into<String>) -> Self {
        Self {
            kind: ListenerKind::NativeClass,
            identifier: identifier.into(),
        }
    }

    /// References a named registry bean.
    pub fn bean(name: impl Into<String>) -> Self {
        Self {
            kind: ListenerKind::RegistryBean,
            identifier: name.into(),
        }
    }
}

impl fmt::Display for ListenerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.identifier)
    }
}

/// One declared component.
///
/// Identity is `code`. `state` and `origin` are owned by the orchestrator
/// and are mutated in place as the component moves through its lifecycle.
///
/// # Example
///
/// ```
/// use stagehand_component::{ComponentDescriptor, ComponentState, ListenerRef};
///
/// let desc = ComponentDescriptor::new("CRM", "crm", "1.2.0")
///     .with_entry_point("/crm/index.html")
///     .with_inline_config("crm.page-size", "20")
///     .with_listener(ListenerRef::bean("crmListener"));
///
/// assert_eq!(desc.state, ComponentState::Disabled);
/// assert_eq!(desc.state_key("stagehand"), "stagehand.component.crm.state");
/// assert!(desc.origin.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDescriptor {
    /// Display name.
    pub name: String,
    /// Globally unique code.
    pub code: String,
    /// Version string.
    pub version: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Primary resource of the component (the `enter` element).
    pub entry_point: String,
    /// External settings file, relative to the origin root.
    #[serde(default)]
    pub config_file: Option<String>,
    /// Inline `config/item` pairs.
    #[serde(default)]
    pub inline_config: BTreeMap<String, String>,
    /// Component-specific metadata; never merged into global settings.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    /// Declared listener, if any.
    #[serde(default)]
    pub listener: Option<ListenerRef>,
    /// Enable state.
    #[serde(default)]
    pub state: ComponentState,
    /// Where the descriptor was loaded from.
    #[serde(default)]
    pub origin: Option<Origin>,
}

impl ComponentDescriptor {
    /// Creates a descriptor with the required identity fields.
    ///
    /// Values are trimmed. The entry point defaults to empty.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        code: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into().trim().to_string(),
            code: code.into().trim().to_string(),
            version: version.into().trim().to_string(),
            description: None,
            entry_point: String::new(),
            config_file: None,
            inline_config: BTreeMap::new(),
            properties: BTreeMap::new(),
            listener: None,
            state: ComponentState::Disabled,
            origin: None,
        }
    }

    /// Sets the entry point.
    #[must_use]
    pub fn with_entry_point(mut self, entry: impl Into<String>) -> Self {
        self.entry_point = entry.into();
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the external config file reference.
    #[must_use]
    pub fn with_config_file(mut self, file: impl Into<String>) -> Self {
        self.config_file = Some(file.into());
        self
    }

    /// Adds one inline config pair.
    #[must_use]
    pub fn with_inline_config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.inline_config.insert(key.into(), value.into());
        self
    }

    /// Adds one extension property.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Sets the listener reference.
    #[must_use]
    pub fn with_listener(mut self, listener: ListenerRef) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Sets the origin.
    #[must_use]
    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Returns the settings key for this component's persisted state.
    #[must_use]
    pub fn state_key(&self, namespace: &str) -> String {
        state_key(namespace, &self.code)
    }

    /// Returns `true` if the config file reference is present and non-blank.
    #[must_use]
    pub fn has_config_file(&self) -> bool {
        self.config_file
            .as_deref()
            .is_some_and(|f| !f.trim().is_empty())
    }

    /// Compares everything except the orchestrator-owned `state`.
    #[must_use]
    pub fn same_declaration(&self, other: &Self) -> bool {
        let mut a = self.clone();
        a.state = other.state;
        a == *other
    }
}

impl fmt::Display for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Component[name={}, code={}, version={}]",
            self.name, self.code, self.version
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_trims_identity() {
        let d = ComponentDescriptor::new(" CRM ", "\tcrm\n", " 1.0 ");
        assert_eq!(d.name, "CRM");
        assert_eq!(d.code, "crm");
        assert_eq!(d.version, "1.0");
        assert_eq!(d.to_string(), "Component[name=CRM, code=crm, version=1.0]");
    }

    #[test]
    fn listener_kind_spellings() {
        assert_eq!(
            "javabean".parse::<ListenerKind>().ok(),
            Some(ListenerKind::NativeClass)
        );
        assert_eq!(
            "native".parse::<ListenerKind>().ok(),
            Some(ListenerKind::NativeClass)
        );
        assert_eq!(
            " spring ".parse::<ListenerKind>().ok(),
            Some(ListenerKind::RegistryBean)
        );
        assert!(matches!(
            "ejb".parse::<ListenerKind>(),
            Err(DescriptorError::UnknownListenerKind(k)) if k == "ejb"
        ));
    }

    #[test]
    fn blank_config_file_is_absent() {
        let d = ComponentDescriptor::new("a", "a", "1").with_config_file("   ");
        assert!(!d.has_config_file());
        let d = d.with_config_file("a.toml");
        assert!(d.has_config_file());
    }

    #[test]
    fn same_declaration_ignores_state() {
        let a = ComponentDescriptor::new("a", "a", "1");
        let mut b = a.clone();
        b.state = ComponentState::Active;
        assert!(a.same_declaration(&b));
        assert_ne!(a, b);

        let c = a.clone().with_property("k", "v");
        assert!(!a.same_declaration(&c));
    }

    #[test]
    fn serde_roundtrip_keeps_origin() {
        let d = ComponentDescriptor::new("a", "a", "1")
            .with_origin(Origin::archive("/lib/a.jar"))
            .with_listener(ListenerRef::native("audit"));
        let json = serde_json::to_string(&d).expect("descriptor should serialize");
        assert!(json.contains("\"kind\":\"archive\""));
        let back: ComponentDescriptor =
            serde_json::from_str(&json).expect("descriptor should deserialize");
        assert_eq!(back, d);
    }
}
