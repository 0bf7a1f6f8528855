//! Test doubles for listener-driven code.
//!
//! [`RecordingListener`] records every hook it receives, in order, and can
//! be told to fail on one event. Share it through an `Arc` to inspect the
//! log after handing it to an orchestrator.
//!
//! ```ignore
//! use stagehand_component::testing::RecordingListener;
//! use stagehand_component::{invoke_hook, LifecycleEvent};
//!
//! let listener = RecordingListener::new().failing_on(LifecycleEvent::BeforeRemove);
//!
//! assert!(invoke_hook(&listener, LifecycleEvent::BeforeActive).is_ok());
//! assert!(invoke_hook(&listener, LifecycleEvent::BeforeRemove).is_err());
//! assert_eq!(
//!     listener.events(),
//!     vec![LifecycleEvent::BeforeActive, LifecycleEvent::BeforeRemove]
//! );
//! ```

use crate::{ComponentListener, HookError, LifecycleEvent};
use parking_lot::Mutex;

/// Listener that records hook invocations.
#[derive(Debug, Default)]
pub struct RecordingListener {
    log: Mutex<Vec<LifecycleEvent>>,
    fail_on: Option<LifecycleEvent>,
}

impl RecordingListener {
    /// Creates a listener whose hooks all succeed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the hook for `event` return an error (after recording it).
    #[must_use]
    pub fn failing_on(mut self, event: LifecycleEvent) -> Self {
        self.fail_on = Some(event);
        self
    }

    /// Returns all recorded events in call order.
    #[must_use]
    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.log.lock().clone()
    }

    /// Counts invocations of one event.
    #[must_use]
    pub fn calls(&self, event: LifecycleEvent) -> usize {
        self.log.lock().iter().filter(|e| **e == event).count()
    }

    /// Clears the log.
    pub fn clear(&self) {
        self.log.lock().clear();
    }

    fn record(&self, event: LifecycleEvent) -> Result<(), HookError> {
        self.log.lock().push(event);
        if self.fail_on == Some(event) {
            Err(HookError::new(format!("{event} rejected by test listener")))
        } else {
            Ok(())
        }
    }
}

impl ComponentListener for RecordingListener {
    fn before_active(&self) -> Result<(), HookError> {
        self.record(LifecycleEvent::BeforeActive)
    }

    fn after_active(&self) -> Result<(), HookError> {
        self.record(LifecycleEvent::AfterActive)
    }

    fn before_deploy(&self) -> Result<(), HookError> {
        self.record(LifecycleEvent::BeforeDeploy)
    }

    fn after_deploy(&self) -> Result<(), HookError> {
        self.record(LifecycleEvent::AfterDeploy)
    }

    fn before_remove(&self) -> Result<(), HookError> {
        self.record(LifecycleEvent::BeforeRemove)
    }

    fn after_remove(&self) -> Result<(), HookError> {
        self.record(LifecycleEvent::AfterRemove)
    }

    fn on_startup(&self) -> Result<(), HookError> {
        self.record(LifecycleEvent::OnStartup)
    }
}
