//! Listener resolution and dispatch.
//!
//! A descriptor names its listener as a [`ListenerRef`]. The platform turns
//! that into a live object through a [`ListenerResolver`]:
//!
//! | Kind | Resolver call | Failure |
//! |------|---------------|---------|
//! | `NativeClass(type_id)` | [`ListenerResolver::instantiate`] | unknown type or constructor error |
//! | `RegistryBean(name)` | [`ListenerResolver::resolve_by_name`] | no bean under that name |
//!
//! [`ListenerRegistry`] is the stock resolver: factories for native types,
//! shared instances for beans.

use stagehand_component::{
    invoke_hook, ComponentListener, LifecycleEvent, ListenerError, ListenerKind, ListenerRef,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::error;

/// Shared handle to a resolved listener.
pub type SharedListener = Arc<dyn ComponentListener>;

/// Constructor for a native listener type.
pub type ListenerFactory = Box<dyn Fn() -> Result<SharedListener, String> + Send + Sync>;

/// Capability-resolution interface used by the platform.
pub trait ListenerResolver: Send + Sync {
    /// Constructs a fresh instance of a registered native type.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::InstantiationFailed`] if the type is unknown
    /// or its constructor fails.
    fn instantiate(&self, type_id: &str) -> Result<SharedListener, ListenerError>;

    /// Looks up a named shared instance.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::NotFound`] if no bean has that name.
    fn resolve_by_name(&self, name: &str) -> Result<SharedListener, ListenerError>;
}

/// In-process resolver backed by registered factories and beans.
///
/// # Example
///
/// ```
/// use stagehand_component::{ComponentListener, ListenerRef};
/// use stagehand_runtime::listener::{resolve_listener, ListenerRegistry};
/// use std::sync::Arc;
///
/// struct Audit;
/// impl ComponentListener for Audit {}
///
/// let registry = ListenerRegistry::new()
///     .with_factory("audit", || Ok(Arc::new(Audit)))
///     .with_bean("shared", Arc::new(Audit));
///
/// assert!(resolve_listener(&registry, &ListenerRef::native("audit")).is_ok());
/// assert!(resolve_listener(&registry, &ListenerRef::bean("shared")).is_ok());
/// assert!(resolve_listener(&registry, &ListenerRef::bean("missing")).is_err());
/// ```
#[derive(Default)]
pub struct ListenerRegistry {
    factories: HashMap<String, ListenerFactory>,
    beans: HashMap<String, SharedListener>,
}

impl ListenerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a native type constructor.
    #[must_use]
    pub fn with_factory<F>(mut self, type_id: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Result<SharedListener, String> + Send + Sync + 'static,
    {
        self.factories.insert(type_id.into(), Box::new(factory));
        self
    }

    /// Registers a named shared instance.
    #[must_use]
    pub fn with_bean(mut self, name: impl Into<String>, bean: SharedListener) -> Self {
        self.beans.insert(name.into(), bean);
        self
    }

    /// Registers a named shared instance in place.
    pub fn insert_bean(&mut self, name: impl Into<String>, bean: SharedListener) {
        self.beans.insert(name.into(), bean);
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<_> = self.factories.keys().collect();
        types.sort();
        let mut beans: Vec<_> = self.beans.keys().collect();
        beans.sort();
        f.debug_struct("ListenerRegistry")
            .field("factories", &types)
            .field("beans", &beans)
            .finish()
    }
}

impl ListenerResolver for ListenerRegistry {
    fn instantiate(&self, type_id: &str) -> Result<SharedListener, ListenerError> {
        let factory = self
            .factories
            .get(type_id)
            .ok_or_else(|| ListenerError::instantiation(type_id, "no such listener type"))?;
        factory().map_err(|message| ListenerError::instantiation(type_id, message))
    }

    fn resolve_by_name(&self, name: &str) -> Result<SharedListener, ListenerError> {
        self.beans
            .get(name)
            .cloned()
            .ok_or_else(|| ListenerError::NotFound(name.to_string()))
    }
}

/// Resolves a listener reference through `resolver`.
///
/// # Errors
///
/// Propagates the resolver's error.
pub fn resolve_listener(
    resolver: &dyn ListenerResolver,
    reference: &ListenerRef,
) -> Result<SharedListener, ListenerError> {
    match reference.kind {
        ListenerKind::NativeClass => resolver.instantiate(&reference.identifier),
        ListenerKind::RegistryBean => resolver.resolve_by_name(&reference.identifier),
    }
}

/// Invokes one hook. A component without a listener succeeds trivially.
///
/// # Errors
///
/// Returns [`ListenerError::HookFailed`] if the hook fails; the failure is
/// also logged.
pub fn fire(
    listener: Option<&SharedListener>,
    code: &str,
    event: LifecycleEvent,
) -> Result<(), ListenerError> {
    let Some(listener) = listener else {
        return Ok(());
    };
    invoke_hook(listener.as_ref(), event).map_err(|source| {
        error!(code = %code, event = %event, error = %source, "listener hook failed");
        ListenerError::hook_failed(code, event, source)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagehand_component::testing::RecordingListener;

    #[test]
    fn native_kind_uses_factory_each_time() {
        let registry = ListenerRegistry::new()
            .with_factory("rec", || Ok(Arc::new(RecordingListener::new()) as SharedListener));

        let a = resolve_listener(&registry, &ListenerRef::native("rec")).expect("known type");
        let b = resolve_listener(&registry, &ListenerRef::native("rec")).expect("known type");
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn bean_kind_returns_shared_instance() {
        let bean: SharedListener = Arc::new(RecordingListener::new());
        let registry = ListenerRegistry::new().with_bean("rec", Arc::clone(&bean));

        let got = resolve_listener(&registry, &ListenerRef::bean("rec")).expect("known bean");
        assert!(Arc::ptr_eq(&got, &bean));
    }

    #[test]
    fn resolution_failures() {
        let registry = ListenerRegistry::new()
            .with_factory("broken", || Err("constructor panicked".to_string()));

        assert!(matches!(
            resolve_listener(&registry, &ListenerRef::bean("nope")),
            Err(ListenerError::NotFound(n)) if n == "nope"
        ));
        assert!(matches!(
            resolve_listener(&registry, &ListenerRef::native("unknown")),
            Err(ListenerError::InstantiationFailed { .. })
        ));
        let err = resolve_listener(&registry, &ListenerRef::native("broken"))
            .err()
            .expect("constructor error");
        assert!(err.to_string().contains("constructor panicked"));
    }

    #[test]
    fn fire_wraps_hook_failure() {
        let listener: SharedListener =
            Arc::new(RecordingListener::new().failing_on(LifecycleEvent::BeforeActive));

        fire(None, "crm", LifecycleEvent::BeforeActive).expect("no listener is ok");
        fire(Some(&listener), "crm", LifecycleEvent::AfterActive).expect("hook ok");
        let err = fire(Some(&listener), "crm", LifecycleEvent::BeforeActive)
            .expect_err("configured to fail");
        assert!(matches!(
            err,
            ListenerError::HookFailed { event: LifecycleEvent::BeforeActive, .. }
        ));
    }
}
