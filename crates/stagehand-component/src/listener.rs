//! Lifecycle listener contract.
//!
//! A component may declare a listener in its descriptor. The orchestrator
//! resolves it once, at registration, and calls its hooks synchronously
//! around each state transition:
//!
//! ```text
//! deploy   : before_deploy  → register, settings, resources, Disabled → after_deploy
//! activate : before_active  → Active                                  → after_active
//! remove   : before_remove  → resources, settings, unregister, purge  → after_remove
//! refresh  : on_startup (every component that ends Active)
//! ```
//!
//! `disable` fires no hooks.

use crate::HookError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The seven hook points a listener can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// Fired for every Active component at the end of reconciliation.
    OnStartup,
    /// Before the state becomes Active.
    BeforeActive,
    /// After the state became Active.
    AfterActive,
    /// Before registration, settings merge and materialization.
    BeforeDeploy,
    /// After the state was set to Disabled by a deploy.
    AfterDeploy,
    /// Before resources and settings are retracted.
    BeforeRemove,
    /// After the component left the registry.
    AfterRemove,
}

impl LifecycleEvent {
    /// Every event, in declaration order.
    pub const ALL: &'static [Self] = &[
        Self::OnStartup,
        Self::BeforeActive,
        Self::AfterActive,
        Self::BeforeDeploy,
        Self::AfterDeploy,
        Self::BeforeRemove,
        Self::AfterRemove,
    ];

    /// Returns `true` for `before_*` events, whose failure aborts the operation.
    #[must_use]
    pub fn is_before(&self) -> bool {
        matches!(
            self,
            Self::BeforeActive | Self::BeforeDeploy | Self::BeforeRemove
        )
    }

    /// Returns the canonical string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnStartup => "on_startup",
            Self::BeforeActive => "before_active",
            Self::AfterActive => "after_active",
            Self::BeforeDeploy => "before_deploy",
            Self::AfterDeploy => "after_deploy",
            Self::BeforeRemove => "before_remove",
            Self::AfterRemove => "after_remove",
        }
    }
}

impl FromStr for LifecycleEvent {
    type Err = HookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| HookError::new(format!("unknown lifecycle event: {s}")))
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hooks invoked around a component's lifecycle transitions.
///
/// All hooks default to no-ops, so implementors override only what they
/// need. Hooks run on the orchestrator's thread; a hook that blocks,
/// blocks the orchestrator.
///
/// # Example
///
/// ```
/// use stagehand_component::{ComponentListener, HookError};
///
/// struct SchemaInstaller;
///
/// impl ComponentListener for SchemaInstaller {
///     fn after_deploy(&self) -> Result<(), HookError> {
///         // run migrations ...
///         Ok(())
///     }
///
///     fn before_remove(&self) -> Result<(), HookError> {
///         Err(HookError::new("refusing to drop tables"))
///     }
/// }
/// ```
pub trait ComponentListener: Send + Sync {
    /// Called before the component becomes Active.
    fn before_active(&self) -> Result<(), HookError> {
        Ok(())
    }

    /// Called after the component became Active.
    fn after_active(&self) -> Result<(), HookError> {
        Ok(())
    }

    /// Called before the component is deployed.
    fn before_deploy(&self) -> Result<(), HookError> {
        Ok(())
    }

    /// Called after the component was deployed.
    fn after_deploy(&self) -> Result<(), HookError> {
        Ok(())
    }

    /// Called before the component is removed.
    fn before_remove(&self) -> Result<(), HookError> {
        Ok(())
    }

    /// Called after the component was removed.
    fn after_remove(&self) -> Result<(), HookError> {
        Ok(())
    }

    /// Called on each reconciliation pass while the component is Active.
    fn on_startup(&self) -> Result<(), HookError> {
        Ok(())
    }
}

/// Invokes the hook matching `event`.
pub fn invoke_hook(
    listener: &dyn ComponentListener,
    event: LifecycleEvent,
) -> Result<(), HookError> {
    match event {
        LifecycleEvent::OnStartup => listener.on_startup(),
        LifecycleEvent::BeforeActive => listener.before_active(),
        LifecycleEvent::AfterActive => listener.after_active(),
        LifecycleEvent::BeforeDeploy => listener.before_deploy(),
        LifecycleEvent::AfterDeploy => listener.after_deploy(),
        LifecycleEvent::BeforeRemove => listener.before_remove(),
        LifecycleEvent::AfterRemove => listener.after_remove(),
    }
}
