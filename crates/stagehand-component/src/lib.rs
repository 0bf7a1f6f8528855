//! Component model for stagehand.
//!
//! This crate defines what a component *is*: its descriptor, its enable
//! state, where it was loaded from and the lifecycle hooks it may observe.
//! It performs no I/O beyond parsing a descriptor document handed to it.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    stagehand-cli                             │
//! │  (binary: config → Platform → one lifecycle command)         │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    stagehand-runtime                         │
//! │  Platform, settings, resources, discovery, listener dispatch │
//! ├─────────────────────────────────────────────────────────────┤
//! │  stagehand-component : descriptor + listener contract ◄ HERE │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Core Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`ComponentDescriptor`] | One declared component, identified by `code` |
//! | [`ComponentState`] | `Active` / `Disabled`, persisted as `"active"` / `"disable"` |
//! | [`Origin`] | Archive or directory the descriptor came from |
//! | [`ListenerRef`] | Declared listener: native type id or registry bean name |
//! | [`ComponentListener`] | The seven lifecycle hooks |
//! | [`LifecycleEvent`] | Names of those hooks |
//!
//! # Example
//!
//! ```
//! use stagehand_component::{parse_descriptors, ListenerKind};
//!
//! let doc = r#"<components>
//!   <component>
//!     <name>Reports</name>
//!     <code>reports</code>
//!     <version>0.3</version>
//!     <enter>/reports/</enter>
//!     <listener type="javabean">reports.audit</listener>
//!   </component>
//! </components>"#;
//!
//! let entries = parse_descriptors(doc).expect("well-formed document");
//! let reports = entries[0].as_ref().expect("complete entry");
//! assert_eq!(reports.code, "reports");
//! assert_eq!(
//!     reports.listener.as_ref().map(|l| l.kind),
//!     Some(ListenerKind::NativeClass)
//! );
//! ```

mod descriptor;
mod error;
mod listener;
mod origin;
mod parse;
mod state;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use descriptor::{ComponentDescriptor, ListenerKind, ListenerRef};
pub use error::{DescriptorError, HookError, ListenerError};
pub use listener::{invoke_hook, ComponentListener, LifecycleEvent};
pub use origin::{Origin, ARCHIVE_EXTENSIONS, DESCRIPTOR_DIR, DESCRIPTOR_FILE, DESCRIPTOR_PATH};
pub use parse::parse_descriptors;
pub use state::{state_key, ComponentState, STATE_ACTIVE, STATE_DISABLED};
