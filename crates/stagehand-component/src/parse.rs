//! Descriptor document parsing.
//!
//! A document holds repeated `component` elements:
//!
//! ```xml
//! <components>
//!   <component>
//!     <name>CRM</name>
//!     <code>crm</code>
//!     <version>1.2.0</version>
//!     <description>Customer records</description>
//!     <enter>/crm/index.html</enter>
//!     <config file="crm.toml">
//!       <item name="crm.page-size">20</item>
//!     </config>
//!     <listener type="spring">crmListener</listener>
//!     <properties>
//!       <property name="menu.group">sales</property>
//!     </properties>
//!   </component>
//! </components>
//! ```
//!
//! A document that fails to parse is one error for the whole origin.
//! A `component` entry that misses a required field is one error for that
//! entry only; the remaining entries are still returned.

use crate::{ComponentDescriptor, DescriptorError, ListenerKind, ListenerRef};
use roxmltree::{Document, Node};

/// Parses every `component` element of a descriptor document.
///
/// # Errors
///
/// Returns [`DescriptorError::Malformed`] if the document is not
/// well-formed. Per-entry failures are returned inside the vector.
pub fn parse_descriptors(
    text: &str,
) -> Result<Vec<Result<ComponentDescriptor, DescriptorError>>, DescriptorError> {
    let doc = Document::parse(text)?;
    Ok(doc
        .root_element()
        .children()
        .filter(|n| is_element(n, "component"))
        .map(|n| parse_component(&n))
        .collect())
}

fn is_element(node: &Node<'_, '_>, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name
}

fn child<'a, 'input>(node: &Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| is_element(n, name))
}

/// Trimmed text of a child element; `None` when absent or blank.
fn child_text(node: &Node<'_, '_>, name: &str) -> Option<String> {
    child(node, name)
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn required(
    node: &Node<'_, '_>,
    field: &'static str,
    code: Option<&str>,
) -> Result<String, DescriptorError> {
    child_text(node, field).ok_or_else(|| DescriptorError::missing_field(field, code))
}

fn parse_component(node: &Node<'_, '_>) -> Result<ComponentDescriptor, DescriptorError> {
    let code = child_text(node, "code");
    let name = required(node, "name", code.as_deref())?;
    let code = code.ok_or_else(|| DescriptorError::missing_field("code", None))?;
    let version = required(node, "version", Some(&code))?;
    let entry = required(node, "enter", Some(&code))?;

    let mut desc = ComponentDescriptor::new(name, code, version).with_entry_point(entry);
    desc.description = child_text(node, "description");
    desc.config_file = child_text(node, "config-file");

    if let Some(config) = child(node, "config") {
        if let Some(file) = config
            .attribute("file")
            .map(str::trim)
            .filter(|f| !f.is_empty())
        {
            desc.config_file = Some(file.to_string());
        }
        desc.inline_config = named_pairs(&config, "item");
    }

    if let Some(props) = child(node, "properties") {
        desc.properties = named_pairs(&props, "property");
    }

    if let Some(listener) = child(node, "listener") {
        desc.listener = parse_listener(&listener, &desc.code);
    }

    Ok(desc)
}

/// Collects `<tag name="k">v</tag>` children. Entries without a name are ignored.
fn named_pairs(node: &Node<'_, '_>, tag: &str) -> std::collections::BTreeMap<String, String> {
    node.children()
        .filter(|n| is_element(n, tag))
        .filter_map(|n| {
            let key = n.attribute("name")?.trim();
            if key.is_empty() {
                return None;
            }
            let value = n.text().map(str::trim).unwrap_or_default();
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

fn parse_listener(node: &Node<'_, '_>, code: &str) -> Option<ListenerRef> {
    let identifier = node.text().map(str::trim).unwrap_or_default();
    if identifier.is_empty() {
        tracing::error!(code = %code, "listener element has no identifier, ignoring");
        return None;
    }
    let kind_attr = node.attribute("type").unwrap_or_default();
    match kind_attr.parse::<ListenerKind>() {
        Ok(kind) => Some(ListenerRef {
            kind,
            identifier: identifier.to_string(),
        }),
        Err(e) => {
            tracing::error!(code = %code, error = %e, "ignoring listener");
            None
        }
    }
}
