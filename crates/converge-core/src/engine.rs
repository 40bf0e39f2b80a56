//! Convergence engine.
//!
//! One engine drives one pass through a fixed sequence:
//!
//! ```text
//! Init → PrerequisitesApplied → VariantResolved → PackagesResolved → Executing → Done | Failed
//! ```
//!
//! Planning (`plan`) applies prerequisite steps, resolves the variant and
//! builds the `ActionList`. Execution (`execute`) dispatches that list one
//! action at a time and stops at the first failure. Nothing is rolled back;
//! whatever the executor changed before the failure stays changed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::action::{Action, ActionList};
use crate::activator::ConditionalActivator;
use crate::error::{ConvergeError, Result};
use crate::executor::{ActionExecutor, StepRunner};
use crate::installer::{self, PackageInstaller};
use crate::registry::StepRegistry;
use crate::resolver::VariantResolver;
use crate::steps;
use crate::types::{PlatformFamily, Variant};

// ---------------------------------------------------------------------------
// RunPhase
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Init,
    PrerequisitesApplied,
    VariantResolved,
    PackagesResolved,
    Executing,
    Done,
    Failed,
}

impl RunPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            RunPhase::Init => "init",
            RunPhase::PrerequisitesApplied => "prerequisites_applied",
            RunPhase::VariantResolved => "variant_resolved",
            RunPhase::PackagesResolved => "packages_resolved",
            RunPhase::Executing => "executing",
            RunPhase::Done => "done",
            RunPhase::Failed => "failed",
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// CancelFlag
// ---------------------------------------------------------------------------

/// Shared abort request, checked before each action is dispatched.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Declaration / Plan
// ---------------------------------------------------------------------------

/// Desired state for one pass, already decoded from configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    pub platform: PlatformFamily,
    pub implementation: Variant,
    pub packages: Vec<String>,
    /// Auxiliary driver binding, installed after every other package.
    pub driver: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub variant: Variant,
    /// Steps this pass delegated to the step runner, in order.
    pub steps_run: Vec<String>,
    pub actions: ActionList,
}

// ---------------------------------------------------------------------------
// ConvergenceEngine
// ---------------------------------------------------------------------------

pub struct ConvergenceEngine {
    declaration: Declaration,
    registry: StepRegistry,
    phase: RunPhase,
    completed: usize,
}

impl ConvergenceEngine {
    /// `registry` holds the steps established before this pass started.
    pub fn new(declaration: Declaration, registry: StepRegistry) -> Self {
        Self {
            declaration,
            registry,
            phase: RunPhase::Init,
            completed: 0,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn registry(&self) -> &StepRegistry {
        &self.registry
    }

    /// Number of actions the executor finished successfully.
    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Plan and execute in one call.
    pub fn converge(
        &mut self,
        runner: &mut dyn StepRunner,
        executor: &mut dyn ActionExecutor,
        cancel: &CancelFlag,
    ) -> Result<Plan> {
        let plan = self.plan(runner)?;
        self.execute(&plan.actions, executor, cancel)?;
        Ok(plan)
    }

    /// Apply prerequisites, resolve the variant, and build the action list.
    ///
    /// Declared packages are validated before any step runs, so malformed
    /// input never reaches the system.
    pub fn plan(&mut self, runner: &mut dyn StepRunner) -> Result<Plan> {
        self.expect_phase(RunPhase::Init, RunPhase::PrerequisitesApplied)?;

        let result = self.plan_inner(runner);
        if result.is_err() {
            self.transition(RunPhase::Failed);
        }
        result
    }

    fn plan_inner(&mut self, runner: &mut dyn StepRunner) -> Result<Plan> {
        let installer = PackageInstaller::new(&self.declaration.packages)?;
        if let Err(ConvergeError::Validation { value, .. }) =
            installer::validate(&[self.declaration.driver.as_str()])
        {
            return Err(ConvergeError::Validation {
                index: self.declaration.packages.len(),
                value,
            });
        }

        let mut steps_run = Vec::new();
        for step in steps::PREREQUISITES {
            if self.run_step_once(step, runner)? {
                steps_run.push(step.to_string());
            }
        }
        self.transition(RunPhase::PrerequisitesApplied);

        let resolution = VariantResolver::new(self.declaration.implementation)
            .resolve(&mut self.registry, runner)?;
        if resolution.included_setup {
            steps_run.push(steps::MARIADB_REPO.to_string());
        }

        let mut actions = ActionList::new();
        actions.extend(
            ConditionalActivator::new(self.declaration.platform)
                .activate(resolution.variant, &self.registry),
        );
        self.transition(RunPhase::VariantResolved);

        actions.extend(installer.actions());
        let driver = self.declaration.driver.as_str();
        if installer.packages().iter().any(|p| p == driver) {
            tracing::debug!(driver, "driver already among declared packages");
        } else {
            actions.push(Action::install(driver));
        }
        self.transition(RunPhase::PackagesResolved);

        Ok(Plan {
            variant: resolution.variant,
            steps_run,
            actions,
        })
    }

    /// Dispatch `actions` in order, stopping at the first failure.
    pub fn execute(
        &mut self,
        actions: &ActionList,
        executor: &mut dyn ActionExecutor,
        cancel: &CancelFlag,
    ) -> Result<()> {
        self.expect_phase(RunPhase::PackagesResolved, RunPhase::Executing)?;
        self.transition(RunPhase::Executing);

        for (index, action) in actions.iter().enumerate() {
            if cancel.is_cancelled() {
                tracing::warn!(index, "run cancelled");
                self.transition(RunPhase::Failed);
                return Err(ConvergeError::Cancelled { index });
            }

            tracing::info!(index, kind = %action.kind, name = %action.name, "dispatching action");
            if let Err(e) = executor.execute(action) {
                tracing::error!(index, %action, error = %e, "action failed");
                self.transition(RunPhase::Failed);
                return Err(ConvergeError::ExecutionFailure {
                    index,
                    action: action.to_string(),
                    reason: format!("{e:#}"),
                });
            }
            self.completed += 1;
        }

        self.transition(RunPhase::Done);
        Ok(())
    }

    /// Returns true if the runner was invoked.
    fn run_step_once(&mut self, step: &str, runner: &mut dyn StepRunner) -> Result<bool> {
        if self.registry.has_run(step) {
            tracing::debug!(step, "step already processed");
            return Ok(false);
        }
        tracing::info!(step, "running prerequisite step");
        runner.run_step(step).map_err(|e| {
            tracing::error!(step, error = %e, "prerequisite step failed");
            ConvergeError::PrerequisiteFailure {
                step: step.to_string(),
                reason: format!("{e:#}"),
            }
        })?;
        self.registry.mark_run(step);
        Ok(true)
    }

    fn expect_phase(&self, expected: RunPhase, next: RunPhase) -> Result<()> {
        if self.phase != expected {
            return Err(ConvergeError::InvalidTransition {
                from: self.phase.to_string(),
                to: next.to_string(),
            });
        }
        Ok(())
    }

    fn transition(&mut self, next: RunPhase) {
        tracing::debug!(from = %self.phase, to = %next, "engine phase");
        self.phase = next;
    }
}
