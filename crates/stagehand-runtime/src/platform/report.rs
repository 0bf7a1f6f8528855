//! Operation results.
//!
//! Multi-step operations are not atomic. Each report lists, in order, every
//! step that failed, so the caller can decide on compensation:
//!
//! ```text
//! deploy crm: completed
//!   settings   : failed to write settings '/srv/app/.stagehand/settings.toml': ...
//!   resources  : I/O error on '/srv/www/js/app.js': ...
//! ```

use super::PlatformError;
use stagehand_component::{ComponentState, LifecycleEvent};
use std::fmt;

/// Public lifecycle operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `activate(code)`.
    Activate,
    /// `disable(code)`.
    Disable,
    /// `deploy(descriptor)` / `redeploy(code)`.
    Deploy,
    /// `remove(code)`.
    Remove,
}

impl Operation {
    /// Lowercase name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Activate => "activate",
            Self::Disable => "disable",
            Self::Deploy => "deploy",
            Self::Remove => "remove",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an operation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Every step ran (some may still have failed; see `errors`).
    Completed,
    /// A `before_*` hook failed; nothing was mutated.
    Aborted,
    /// The code is not registered; nothing was done.
    UnknownComponent,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Completed => "completed",
            Self::Aborted => "aborted",
            Self::UnknownComponent => "unknown component",
        })
    }
}

/// Step at which a failure was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Enumerating origins.
    Scan,
    /// Reading or parsing a descriptor document.
    Descriptor,
    /// Resolving a declared listener.
    ResolveListener,
    /// Running a hook.
    Hook(LifecycleEvent),
    /// Merging or removing component settings.
    Settings,
    /// Materializing or retracting resources.
    Resources,
    /// Writing or clearing the persisted state key.
    PersistState,
    /// Restoring state from the store.
    RestoreState,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scan => f.write_str("scan"),
            Self::Descriptor => f.write_str("descriptor"),
            Self::ResolveListener => f.write_str("resolve listener"),
            Self::Hook(event) => write!(f, "hook {event}"),
            Self::Settings => f.write_str("settings"),
            Self::Resources => f.write_str("resources"),
            Self::PersistState => f.write_str("persist state"),
            Self::RestoreState => f.write_str("restore state"),
        }
    }
}

/// One recorded failure.
#[derive(Debug)]
pub struct StepError {
    /// Where it happened.
    pub step: Step,
    /// What happened.
    pub error: PlatformError,
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.step, self.error)
    }
}

/// Result of one lifecycle operation on one component.
#[derive(Debug)]
pub struct OperationReport {
    /// Component code.
    pub code: String,
    /// Operation performed.
    pub operation: Operation,
    /// How it ended.
    pub outcome: Outcome,
    /// Failures, in the order they occurred.
    pub errors: Vec<StepError>,
}

impl OperationReport {
    pub(crate) fn new(code: &str, operation: Operation) -> Self {
        Self {
            code: code.to_string(),
            operation,
            outcome: Outcome::Completed,
            errors: Vec::new(),
        }
    }

    pub(crate) fn unknown(code: &str, operation: Operation) -> Self {
        let mut report = Self::new(code, operation);
        report.outcome = Outcome::UnknownComponent;
        report
    }

    pub(crate) fn record(&mut self, step: Step, error: impl Into<PlatformError>) {
        self.errors.push(StepError {
            step,
            error: error.into(),
        });
    }

    pub(crate) fn abort(&mut self, step: Step, error: impl Into<PlatformError>) {
        self.record(step, error);
        self.outcome = Outcome::Aborted;
    }

    /// Completed with no recorded failure.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Completed && self.errors.is_empty()
    }
}

impl fmt::Display for OperationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.operation, self.code, self.outcome)?;
        for e in &self.errors {
            write!(f, "\n  {e}")?;
        }
        Ok(())
    }
}

/// Result of one refresh (scan plus reconciliation).
#[derive(Debug, Default)]
pub struct RefreshReport {
    /// Codes registered by this scan, in discovery order.
    pub registered: Vec<String>,
    /// Components whose state was restored from the store.
    pub restored: Vec<(String, ComponentState)>,
    /// Deploy/activate operations run for newly discovered components.
    pub operations: Vec<OperationReport>,
    /// Components that received `on_startup`.
    pub started: Vec<String>,
    /// Failures outside any single operation (scan, descriptors, listeners, startup hooks).
    pub errors: Vec<StepError>,
}

impl RefreshReport {
    pub(crate) fn record(&mut self, step: Step, error: impl Into<PlatformError>) {
        self.errors.push(StepError {
            step,
            error: error.into(),
        });
    }

    /// No failure anywhere in the pass.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.errors.is_empty() && self.operations.iter().all(OperationReport::is_success)
    }

    /// Iterates every failure, including those inside operations.
    pub fn all_errors(&self) -> impl Iterator<Item = &StepError> {
        self.errors
            .iter()
            .chain(self.operations.iter().flat_map(|op| op.errors.iter()))
    }
}
