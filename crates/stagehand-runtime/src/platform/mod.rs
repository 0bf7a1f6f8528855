//! The orchestrator.
//!
//! A [`Platform`] owns the component registry, the settings store and the
//! reconciliation loop. It is built once per process and passed to callers.
//!
//! # Lifecycle
//!
//! ```text
//!              scan                deploy               activate
//! Unregistered ─────► Registered ─────────► Disabled ◄─────────► Active
//!                                              │       disable      │
//!                                              └──────┬─────────────┘
//!                                                     │ remove
//!                                                     ▼
//!                                                  Removed
//! ```
//!
//! # Reconciliation (`refresh`)
//!
//! 1. Ask every [`OriginProvider`](crate::discovery::OriginProvider) for origins.
//! 2. Read `META-INF/components-def.xml` from each; register codes not yet known.
//! 3. For each registered component: restore the persisted state if the
//!    state key exists, otherwise deploy then activate it.
//! 4. Fire `on_startup` for every component that ends Active.
//!
//! # Threading
//!
//! Operations take `&mut self`; callers that share a platform must
//! serialize access themselves. All I/O is blocking.

mod builder;
mod error;
mod report;

pub use builder::PlatformBuilder;
pub use error::PlatformError;
pub use report::{Operation, OperationReport, Outcome, RefreshReport, Step, StepError};

use crate::config::StageConfig;
use crate::discovery::OriginProvider;
use crate::listener::{fire, resolve_listener, ListenerResolver, SharedListener};
use crate::resource::{read_origin_file, ResourceMaterializer};
use crate::settings::{merge_settings, remove_settings, SettingsStore};
use stagehand_component::{
    parse_descriptors, state_key, ComponentDescriptor, ComponentState, LifecycleEvent, Origin,
    DESCRIPTOR_PATH,
};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// A registered component and its resolved listener.
struct RegisteredComponent {
    descriptor: ComponentDescriptor,
    listener: Option<SharedListener>,
}

/// Component lifecycle orchestrator.
pub struct Platform {
    config: StageConfig,
    settings: SettingsStore,
    log_status: SettingsStore,
    environment: BTreeMap<String, String>,
    registry: BTreeMap<String, RegisteredComponent>,
    providers: Vec<Box<dyn OriginProvider>>,
    resolver: Arc<dyn ListenerResolver>,
    materializer: ResourceMaterializer,
    started: bool,
}

impl std::fmt::Debug for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Platform")
            .field("namespace", &self.config.namespace)
            .field("components", &self.registry.keys().collect::<Vec<_>>())
            .field("started", &self.started)
            .finish_non_exhaustive()
    }
}

impl Platform {
    /// Shorthand for [`PlatformBuilder::new`].
    #[must_use]
    pub fn builder(config: StageConfig) -> PlatformBuilder {
        PlatformBuilder::new(config)
    }

    // ─── Entry points ───────────────────────────────────────────────

    /// Runs the first refresh. Later calls do nothing and return `None`.
    pub fn start(&mut self) -> Option<RefreshReport> {
        if self.started {
            info!("platform already started");
            return None;
        }
        self.started = true;
        Some(self.refresh())
    }

    /// Returns `true` once [`start`](Self::start) has run.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Scans all origins, registers new codes and reconciles state.
    ///
    /// Safe to call repeatedly: already registered codes are skipped and
    /// already tracked components only have their state restored.
    pub fn refresh(&mut self) -> RefreshReport {
        let mut report = RefreshReport::default();
        self.scan(&mut report);
        self.state_check(&mut report);
        info!(
            components = self.registry.len(),
            registered = report.registered.len(),
            started = report.started.len(),
            failures = report.all_errors().count(),
            "refresh complete"
        );
        report
    }

    // ─── Lifecycle operations ───────────────────────────────────────

    /// Activates a registered component.
    ///
    /// `before_active` → state Active (memory and store) → `after_active`.
    pub fn activate(&mut self, code: &str) -> OperationReport {
        let Some(listener) = self.lookup(code, Operation::Activate) else {
            return OperationReport::unknown(code, Operation::Activate);
        };
        let mut report = OperationReport::new(code, Operation::Activate);

        if let Err(e) = fire(listener.as_ref(), code, LifecycleEvent::BeforeActive) {
            report.abort(Step::Hook(LifecycleEvent::BeforeActive), e);
            return report;
        }
        self.set_state(code, ComponentState::Active, &mut report);
        if let Err(e) = fire(listener.as_ref(), code, LifecycleEvent::AfterActive) {
            report.record(Step::Hook(LifecycleEvent::AfterActive), e);
        }
        info!(code = %code, "component activated");
        report
    }

    /// Disables a registered component. Fires no hooks.
    pub fn disable(&mut self, code: &str) -> OperationReport {
        if self.lookup(code, Operation::Disable).is_none() {
            return OperationReport::unknown(code, Operation::Disable);
        }
        let mut report = OperationReport::new(code, Operation::Disable);
        self.set_state(code, ComponentState::Disabled, &mut report);
        info!(code = %code, "component disabled");
        report
    }

    /// Deploys `descriptor`, registering it first.
    ///
    /// `before_deploy` → register → (with an origin) merge settings and
    /// materialize resources → state Disabled → `after_deploy`. Deploy
    /// never activates.
    pub fn deploy(&mut self, descriptor: ComponentDescriptor) -> OperationReport {
        let code = descriptor.code.clone();
        let mut report = OperationReport::new(&code, Operation::Deploy);

        let listener = match self.registry.get(&code) {
            Some(existing) if existing.descriptor.listener == descriptor.listener => {
                existing.listener.clone()
            }
            _ => self.resolve_for(&descriptor, &mut |step, e| report.record(step, e)),
        };
        if let Err(e) = fire(listener.as_ref(), &code, LifecycleEvent::BeforeDeploy) {
            report.abort(Step::Hook(LifecycleEvent::BeforeDeploy), e);
            return report;
        }

        let keep_state = self
            .registry
            .get(&code)
            .map(|existing| existing.descriptor.state);
        let mut descriptor = descriptor;
        if let Some(state) = keep_state {
            descriptor.state = state;
        }
        self.registry.insert(
            code.clone(),
            RegisteredComponent {
                descriptor,
                listener: listener.clone(),
            },
        );
        self.deploy_steps(&code, listener.as_ref(), &mut report);
        report
    }

    /// Deploys an already registered component again.
    pub fn redeploy(&mut self, code: &str) -> OperationReport {
        let Some(listener) = self.lookup(code, Operation::Deploy) else {
            return OperationReport::unknown(code, Operation::Deploy);
        };
        let mut report = OperationReport::new(code, Operation::Deploy);
        if let Err(e) = fire(listener.as_ref(), code, LifecycleEvent::BeforeDeploy) {
            report.abort(Step::Hook(LifecycleEvent::BeforeDeploy), e);
            return report;
        }
        self.deploy_steps(code, listener.as_ref(), &mut report);
        report
    }

    /// Removes a registered component.
    ///
    /// `before_remove` → retract resources → remove config-file settings →
    /// unregister → clear the state key → `after_remove`.
    pub fn remove(&mut self, code: &str) -> OperationReport {
        let Some(listener) = self.lookup(code, Operation::Remove) else {
            return OperationReport::unknown(code, Operation::Remove);
        };
        let mut report = OperationReport::new(code, Operation::Remove);

        if let Err(e) = fire(listener.as_ref(), code, LifecycleEvent::BeforeRemove) {
            report.abort(Step::Hook(LifecycleEvent::BeforeRemove), e);
            return report;
        }

        let descriptor = self
            .registry
            .get(code)
            .map(|entry| entry.descriptor.clone());
        if let Some(descriptor) = &descriptor {
            if let Some(origin) = &descriptor.origin {
                match self
                    .materializer
                    .remove_resources(origin, &self.config.paths.webroot)
                {
                    Ok(r) => {
                        for failure in r.failures {
                            report.record(Step::Resources, failure);
                        }
                    }
                    Err(e) => {
                        error!(code = %code, error = %e, "failed to remove resources");
                        report.record(Step::Resources, e);
                    }
                }
                if let Err(e) = remove_settings(descriptor, &mut self.settings) {
                    error!(code = %code, error = %e, "failed to remove settings");
                    report.record(Step::Settings, e);
                }
            }
        }

        self.registry.remove(code);
        let key = self.state_key(code);
        if let Err(e) = self.settings.remove(&key) {
            error!(code = %code, error = %e, "failed to clear persisted state");
            report.record(Step::PersistState, e);
        }

        if let Err(e) = fire(listener.as_ref(), code, LifecycleEvent::AfterRemove) {
            report.record(Step::Hook(LifecycleEvent::AfterRemove), e);
        }
        info!(code = %code, "component removed");
        report
    }

    /// Removes the component registered under `descriptor.code`.
    pub fn remove_descriptor(&mut self, descriptor: &ComponentDescriptor) -> OperationReport {
        self.remove(&descriptor.code)
    }

    /// Registers `descriptor` without deploying it and without hooks.
    ///
    /// An existing entry with the same code is replaced; the replaced
    /// descriptor is returned. Listener resolution failures are logged and
    /// leave the component without a listener.
    pub fn register(&mut self, descriptor: ComponentDescriptor) -> Option<ComponentDescriptor> {
        let listener = self.resolve_for(&descriptor, &mut |_, _| {});
        self.insert(descriptor, listener)
    }

    // ─── Inspection ─────────────────────────────────────────────────

    /// Returns the registered descriptor for `code`.
    #[must_use]
    pub fn component(&self, code: &str) -> Option<&ComponentDescriptor> {
        self.registry.get(code).map(|entry| &entry.descriptor)
    }

    /// Iterates registered descriptors in code order.
    pub fn components(&self) -> impl Iterator<Item = &ComponentDescriptor> {
        self.registry.values().map(|entry| &entry.descriptor)
    }

    /// Returns owned copies of all registered descriptors.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ComponentDescriptor> {
        self.components().cloned().collect()
    }

    /// In-memory state of a registered component.
    #[must_use]
    pub fn state_of(&self, code: &str) -> Option<ComponentState> {
        self.component(code).map(|d| d.state)
    }

    /// Raw persisted state value, independent of registration.
    #[must_use]
    pub fn persisted_state(&self, code: &str) -> Option<&str> {
        self.settings.get(&self.state_key(code))
    }

    /// Version of a registered component.
    #[must_use]
    pub fn version(&self, code: &str) -> Option<&str> {
        self.component(code).map(|d| d.version.as_str())
    }

    /// Returns `true` if the component has a resolved listener.
    #[must_use]
    pub fn has_listener(&self, code: &str) -> bool {
        self.registry
            .get(code)
            .is_some_and(|entry| entry.listener.is_some())
    }

    /// Number of registered components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// The settings store.
    #[must_use]
    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    /// The log status store.
    #[must_use]
    pub fn log_status(&self) -> &SettingsStore {
        &self.log_status
    }

    /// Settings as they were when the platform was built.
    #[must_use]
    pub fn environment(&self) -> &BTreeMap<String, String> {
        &self.environment
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    /// Destination root for resources.
    #[must_use]
    pub fn webroot(&self) -> &Path {
        &self.config.paths.webroot
    }

    // ─── Internals ──────────────────────────────────────────────────

    fn state_key(&self, code: &str) -> String {
        state_key(&self.config.namespace, code)
    }

    /// Returns the component's listener, or `None` (logged) if unknown.
    #[allow(clippy::option_option)]
    fn lookup(&self, code: &str, op: Operation) -> Option<Option<SharedListener>> {
        match self.registry.get(code) {
            Some(entry) => Some(entry.listener.clone()),
            None => {
                warn!(code = %code, operation = %op, "unknown component, ignoring");
                None
            }
        }
    }

    fn insert(
        &mut self,
        descriptor: ComponentDescriptor,
        listener: Option<SharedListener>,
    ) -> Option<ComponentDescriptor> {
        let code = descriptor.code.clone();
        let replaced = self.registry.insert(
            code.clone(),
            RegisteredComponent {
                descriptor,
                listener,
            },
        );
        if replaced.is_some() {
            warn!(code = %code, "component replaced without removal hooks");
        } else {
            debug!(code = %code, "component registered");
        }
        replaced.map(|entry| entry.descriptor)
    }

    fn resolve_for(
        &self,
        descriptor: &ComponentDescriptor,
        on_error: &mut dyn FnMut(Step, PlatformError),
    ) -> Option<SharedListener> {
        let reference = descriptor.listener.as_ref()?;
        match resolve_listener(self.resolver.as_ref(), reference) {
            Ok(listener) => Some(listener),
            Err(e) => {
                error!(
                    code = %descriptor.code,
                    listener = %reference,
                    error = %e,
                    "listener resolution failed, continuing without listener"
                );
                on_error(Step::ResolveListener, e.into());
                None
            }
        }
    }

    fn set_state(&mut self, code: &str, state: ComponentState, report: &mut OperationReport) {
        if let Some(entry) = self.registry.get_mut(code) {
            entry.descriptor.state = state;
        }
        let key = self.state_key(code);
        if let Err(e) = self.settings.set(key, state.as_persisted()) {
            error!(code = %code, error = %e, "failed to persist state");
            report.record(Step::PersistState, e);
        }
    }

    fn deploy_steps(
        &mut self,
        code: &str,
        listener: Option<&SharedListener>,
        report: &mut OperationReport,
    ) {
        let origin = self
            .registry
            .get(code)
            .and_then(|entry| entry.descriptor.origin.clone());
        if let Some(origin) = origin {
            if let Some(descriptor) = self.registry.get(code).map(|e| e.descriptor.clone()) {
                if let Err(e) = merge_settings(&descriptor, &mut self.settings) {
                    error!(code = %code, error = %e, "failed to merge settings");
                    report.record(Step::Settings, e);
                }
            }
            match self
                .materializer
                .deploy_resources(&origin, &self.config.paths.webroot)
            {
                Ok(r) => {
                    for failure in r.failures {
                        report.record(Step::Resources, failure);
                    }
                }
                Err(e) => {
                    error!(code = %code, origin = %origin, error = %e, "failed to deploy resources");
                    report.record(Step::Resources, e);
                }
            }
        } else {
            debug!(code = %code, "no origin, skipping settings and resources");
        }

        self.set_state(code, ComponentState::Disabled, report);
        if let Err(e) = fire(listener, code, LifecycleEvent::AfterDeploy) {
            report.record(Step::Hook(LifecycleEvent::AfterDeploy), e);
        }
        info!(code = %code, "component deployed");
    }

    fn scan(&mut self, report: &mut RefreshReport) {
        let mut origins = Vec::new();
        for provider in &self.providers {
            match provider.origins() {
                Ok(found) => origins.extend(found),
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "origin provider failed");
                    report.record(Step::Scan, e);
                }
            }
        }

        // Codes known before this pass are left alone; within the pass the
        // last declaration of a code wins.
        let mut seen_this_pass = HashSet::new();
        for origin in origins {
            for descriptor in self.read_descriptors(&origin, report) {
                let repeated = seen_this_pass.contains(&descriptor.code);
                if !repeated && self.registry.contains_key(&descriptor.code) {
                    debug!(code = %descriptor.code, origin = %origin, "already registered");
                    continue;
                }
                let code = descriptor.code.clone();
                let listener =
                    self.resolve_for(&descriptor, &mut |step, e| report.record(step, e));
                self.insert(descriptor, listener);
                info!(code = %code, origin = %origin, "component discovered");
                if !repeated {
                    report.registered.push(code.clone());
                    seen_this_pass.insert(code);
                }
            }
        }
    }

    fn read_descriptors(
        &self,
        origin: &Origin,
        report: &mut RefreshReport,
    ) -> Vec<ComponentDescriptor> {
        let bytes = match read_origin_file(origin, DESCRIPTOR_PATH) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!(origin = %origin, "no descriptor, skipped");
                return Vec::new();
            }
            Err(e) => {
                warn!(origin = %origin, error = %e, "cannot read descriptor");
                report.record(Step::Descriptor, e);
                return Vec::new();
            }
        };
        let text = String::from_utf8_lossy(&bytes);
        let entries = match parse_descriptors(&text) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(origin = %origin, error = %e, "malformed descriptor, origin skipped");
                report.record(Step::Descriptor, PlatformError::descriptor(origin, e));
                return Vec::new();
            }
        };
        entries
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(mut descriptor) => {
                    descriptor.origin = Some(origin.clone());
                    Some(descriptor)
                }
                Err(e) => {
                    warn!(origin = %origin, error = %e, "invalid component entry skipped");
                    report.record(Step::Descriptor, PlatformError::descriptor(origin, e));
                    None
                }
            })
            .collect()
    }

    fn state_check(&mut self, report: &mut RefreshReport) {
        let codes: Vec<String> = self.registry.keys().cloned().collect();
        for code in codes {
            let persisted = self
                .settings
                .get(&self.state_key(&code))
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string);

            match persisted {
                Some(value) => {
                    let state = ComponentState::from_persisted(&value).unwrap_or_else(|| {
                        warn!(code = %code, value = %value, "unrecognized persisted state, treating as disabled");
                        report.record(
                            Step::RestoreState,
                            PlatformError::InvalidState {
                                code: code.clone(),
                                value: value.clone(),
                            },
                        );
                        ComponentState::Disabled
                    });
                    if let Some(entry) = self.registry.get_mut(&code) {
                        entry.descriptor.state = state;
                    }
                    debug!(code = %code, state = %state, "state restored");
                    report.restored.push((code.clone(), state));
                }
                None => {
                    info!(code = %code, "new component, deploying and activating");
                    let deployed = self.redeploy(&code);
                    let aborted = deployed.outcome != Outcome::Completed;
                    report.operations.push(deployed);
                    if !aborted {
                        report.operations.push(self.activate(&code));
                    }
                }
            }

            let Some(entry) = self.registry.get(&code) else {
                continue;
            };
            if entry.descriptor.state.is_active() {
                let listener = entry.listener.clone();
                if let Err(e) = fire(listener.as_ref(), &code, LifecycleEvent::OnStartup) {
                    report.record(Step::Hook(LifecycleEvent::OnStartup), e);
                }
                report.started.push(code);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::StaticOrigins;
    use crate::listener::ListenerRegistry;
    use stagehand_component::testing::RecordingListener;
    use stagehand_component::ListenerRef;
    use tracing_test::traced_test;

    fn platform() -> Platform {
        let mut config = StageConfig::default();
        config.export_env = false;
        Platform::builder(config)
            .with_settings(SettingsStore::in_memory())
            .with_log_status(SettingsStore::in_memory())
            .with_provider(StaticOrigins::default())
            .build()
    }

    #[traced_test]
    #[test]
    fn unknown_code_is_logged_and_ignored() {
        let mut p = platform();
        p.register(ComponentDescriptor::new("a", "a", "1"));

        let a = p.activate("does-not-exist");
        let r = p.remove("does-not-exist");
        let d = p.disable("does-not-exist");

        assert_eq!(a.outcome, Outcome::UnknownComponent);
        assert_eq!(r.outcome, Outcome::UnknownComponent);
        assert_eq!(d.outcome, Outcome::UnknownComponent);
        assert_eq!(p.len(), 1);
        assert!(p.persisted_state("does-not-exist").is_none());
        assert!(logs_contain("unknown component"));
        assert!(logs_contain("does-not-exist"));
    }

    #[test]
    fn start_runs_once() {
        let mut p = platform();
        assert!(!p.is_started());
        assert!(p.start().is_some());
        assert!(p.is_started());
        assert!(p.start().is_none());
    }

    #[test]
    fn register_replaces_without_hooks() {
        let rec = Arc::new(RecordingListener::new());
        let mut config = StageConfig::default();
        config.export_env = false;
        let mut p = Platform::builder(config)
            .with_settings(SettingsStore::in_memory())
            .with_provider(StaticOrigins::default())
            .with_resolver(ListenerRegistry::new().with_bean("rec", rec.clone()))
            .build();

        let first = ComponentDescriptor::new("A", "a", "1").with_listener(ListenerRef::bean("rec"));
        assert!(p.register(first).is_none());
        let replaced = p
            .register(ComponentDescriptor::new("A", "a", "2"))
            .expect("first should be replaced");

        assert_eq!(replaced.version, "1");
        assert_eq!(p.version("a"), Some("2"));
        assert_eq!(p.len(), 1);
        assert!(rec.events().is_empty());
        assert!(!p.has_listener("a"));
    }

    #[test]
    fn deploy_without_origin_sets_disabled_only() {
        let mut p = platform();
        let report = p.deploy(ComponentDescriptor::new("a", "a", "1").with_inline_config("k", "v"));

        assert!(report.is_success());
        assert_eq!(p.persisted_state("a"), Some("disable"));
        assert_eq!(p.state_of("a"), Some(ComponentState::Disabled));
        assert!(!p.settings().contains_key("k"));
    }

    #[test]
    fn failed_before_hook_aborts_without_mutation() {
        let rec = Arc::new(RecordingListener::new().failing_on(LifecycleEvent::BeforeActive));
        let mut config = StageConfig::default();
        config.export_env = false;
        let mut p = Platform::builder(config)
            .with_settings(SettingsStore::in_memory())
            .with_provider(StaticOrigins::default())
            .with_resolver(ListenerRegistry::new().with_bean("rec", rec.clone()))
            .build();

        p.deploy(ComponentDescriptor::new("a", "a", "1").with_listener(ListenerRef::bean("rec")));
        let report = p.activate("a");

        assert_eq!(report.outcome, Outcome::Aborted);
        assert_eq!(p.persisted_state("a"), Some("disable"));
        assert_eq!(rec.calls(LifecycleEvent::AfterActive), 0);
    }

    #[test]
    fn unrecognized_persisted_state_counts_as_disabled() {
        let mut store = SettingsStore::in_memory();
        store
            .set("stagehand.component.a.state", "enabled")
            .expect("in-memory set");
        let mut config = StageConfig::default();
        config.export_env = false;
        let mut p = Platform::builder(config)
            .with_settings(store)
            .with_provider(StaticOrigins::default())
            .build();
        p.register(ComponentDescriptor::new("a", "a", "1"));

        let report = p.refresh();

        assert_eq!(p.state_of("a"), Some(ComponentState::Disabled));
        assert!(report.operations.is_empty());
        assert!(matches!(
            report.errors[0].error,
            PlatformError::InvalidState { .. }
        ));
    }
}
