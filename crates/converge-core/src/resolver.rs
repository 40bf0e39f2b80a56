//! Active variant selection.
//!
//! The configured implementation is a request; steps that already ran are
//! evidence. When they disagree the evidence wins: a pass that finds the
//! mariadb repository step already applied treats the target as
//! mariadb-family even if the configuration still says `default`.

use crate::error::{ConvergeError, Result};
use crate::executor::StepRunner;
use crate::registry::StepRegistry;
use crate::steps;
use crate::types::Variant;

/// Outcome of variant resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub variant: Variant,
    /// True when this pass had to run the variant's setup step itself.
    pub included_setup: bool,
}

pub struct VariantResolver {
    requested: Variant,
}

impl VariantResolver {
    pub fn new(requested: Variant) -> Self {
        Self { requested }
    }

    /// Decide the active variant without side effects.
    pub fn select(&self, registry: &StepRegistry) -> Variant {
        if self.requested.is_mariadb_family() {
            return self.requested;
        }
        if registry.has_run(steps::MARIADB_REPO) {
            return Variant::Mariadb;
        }
        self.requested
    }

    /// Decide the active variant and make sure its setup step has run,
    /// delegating to `runner` at most once per pass.
    pub fn resolve(
        &self,
        registry: &mut StepRegistry,
        runner: &mut dyn StepRunner,
    ) -> Result<Resolution> {
        let variant = self.select(registry);
        let mut included_setup = false;

        if variant.is_mariadb_family() && !registry.has_run(steps::MARIADB_REPO) {
            tracing::info!(step = steps::MARIADB_REPO, %variant, "including variant setup step");
            runner.run_step(steps::MARIADB_REPO).map_err(|e| {
                tracing::error!(step = steps::MARIADB_REPO, error = %e, "variant setup failed");
                ConvergeError::PrerequisiteFailure {
                    step: steps::MARIADB_REPO.to_string(),
                    reason: format!("{e:#}"),
                }
            })?;
            registry.mark_run(steps::MARIADB_REPO);
            included_setup = true;
        }

        if variant != self.requested {
            tracing::info!(
                requested = %self.requested,
                resolved = %variant,
                "prior step evidence overrides configured implementation"
            );
        }

        Ok(Resolution {
            variant,
            included_setup,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::RecordingStepRunner;

    struct FailingRunner;

    impl StepRunner for FailingRunner {
        fn run_step(&mut self, _step: &str) -> anyhow::Result<()> {
            anyhow::bail!("repository mirror unreachable")
        }
    }

    #[test]
    fn default_stays_default_without_evidence() {
        let mut reg = StepRegistry::new();
        let mut runner = RecordingStepRunner::new();
        let res = VariantResolver::new(Variant::Default)
            .resolve(&mut reg, &mut runner)
            .unwrap();
        assert_eq!(res.variant, Variant::Default);
        assert!(!res.included_setup);
        assert!(runner.ran.is_empty());
    }

    #[test]
    fn mariadb_request_includes_setup_once() {
        let mut reg = StepRegistry::new();
        let mut runner = RecordingStepRunner::new();
        let resolver = VariantResolver::new(Variant::Mariadb);

        let first = resolver.resolve(&mut reg, &mut runner).unwrap();
        let second = resolver.resolve(&mut reg, &mut runner).unwrap();

        assert!(first.included_setup);
        assert!(!second.included_setup);
        assert_eq!(runner.ran, vec![steps::MARIADB_REPO]);
        assert!(reg.has_run(steps::MARIADB_REPO));
    }

    #[test]
    fn galera_resolves_to_mariadb_family() {
        let mut reg = StepRegistry::new();
        let mut runner = RecordingStepRunner::new();
        let res = VariantResolver::new(Variant::Galera)
            .resolve(&mut reg, &mut runner)
            .unwrap();
        assert_eq!(res.variant, Variant::Galera);
        assert_eq!(runner.ran, vec![steps::MARIADB_REPO]);
    }

    #[test]
    fn prior_mariadb_step_overrides_default() {
        let mut reg: StepRegistry = [steps::MARIADB_REPO].into_iter().collect();
        let mut runner = RecordingStepRunner::new();
        let res = VariantResolver::new(Variant::Default)
            .resolve(&mut reg, &mut runner)
            .unwrap();
        assert_eq!(res.variant, Variant::Mariadb);
        assert!(!res.included_setup);
        assert!(runner.ran.is_empty());
    }

    #[test]
    fn prior_mariadb_step_overrides_percona_request() {
        let reg: StepRegistry = [steps::MARIADB_REPO].into_iter().collect();
        assert_eq!(VariantResolver::new(Variant::Percona).select(&reg), Variant::Mariadb);
    }

    #[test]
    fn failed_setup_is_a_prerequisite_failure() {
        let mut reg = StepRegistry::new();
        let err = VariantResolver::new(Variant::Mariadb)
            .resolve(&mut reg, &mut FailingRunner)
            .unwrap_err();
        match err {
            ConvergeError::PrerequisiteFailure { step, reason } => {
                assert_eq!(step, steps::MARIADB_REPO);
                assert!(reason.contains("unreachable"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!reg.has_run(steps::MARIADB_REPO));
    }
}
