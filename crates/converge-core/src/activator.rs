//! Platform-gated repository activation.
//!
//! Repository steps only declare a source; activation is what registers it
//! with the package manager. Which resources get activated depends on the
//! platform family and on which repository steps ran earlier in the pass.

use crate::action::Action;
use crate::registry::StepRegistry;
use crate::steps;
use crate::types::{PlatformFamily, Variant};

pub const PERCONA_REPOSITORY: &str = "percona";
pub const PERCONA_GPG_KEY: &str = "RPM-GPG-KEY-percona";
pub const MARIADB_REPOSITORY: &str = "mariadb";

pub struct ConditionalActivator {
    platform: PlatformFamily,
}

impl ConditionalActivator {
    pub fn new(platform: PlatformFamily) -> Self {
        Self { platform }
    }

    /// Repository actions for this pass, percona first.
    pub fn activate(&self, variant: Variant, registry: &StepRegistry) -> Vec<Action> {
        let mut actions = Vec::new();
        if registry.has_run(steps::PERCONA_REPO) {
            actions.extend(self.percona());
        }
        if variant.is_mariadb_family() {
            actions.extend(self.mariadb());
        }
        actions
    }

    /// The signing key has to be in place before the repository is used.
    fn percona(&self) -> Vec<Action> {
        match self.platform {
            PlatformFamily::Debian => vec![Action::add_repository(PERCONA_REPOSITORY)],
            PlatformFamily::Rhel => vec![
                Action::add_gpgkey(PERCONA_GPG_KEY),
                Action::add_repository(PERCONA_REPOSITORY),
            ],
            PlatformFamily::Other => Vec::new(),
        }
    }

    /// Only debian registers an explicit source; rhel hosts get MariaDB
    /// packages from metadata configured outside this pass.
    fn mariadb(&self) -> Option<Action> {
        match self.platform {
            PlatformFamily::Debian => Some(Action::add_repository(MARIADB_REPOSITORY)),
            PlatformFamily::Rhel | PlatformFamily::Other => None,
        }
    }
}
