use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ---------------------------------------------------------------------------
// StepRegistry
// ---------------------------------------------------------------------------

/// Steps processed during the current convergence pass.
///
/// Run-scoped: a fresh registry is built for every pass and steps are never
/// removed from it. Insertion order is kept so run records list steps in the
/// order they completed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct StepRegistry {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_run(&self, step: &str) -> bool {
        self.seen.contains(step)
    }

    /// Record `step` as processed. Returns false if it was already recorded.
    pub fn mark_run(&mut self, step: &str) -> bool {
        if !self.seen.insert(step.to_string()) {
            return false;
        }
        self.order.push(step.to_string());
        true
    }

    pub fn steps(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for StepRegistry {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut registry = Self::new();
        for step in iter {
            registry.mark_run(step.as_ref());
        }
        registry
    }
}

impl From<Vec<String>> for StepRegistry {
    fn from(steps: Vec<String>) -> Self {
        steps.into_iter().collect()
    }
}

impl From<StepRegistry> for Vec<String> {
    fn from(registry: StepRegistry) -> Self {
        registry.order
    }
}
