use std::collections::HashSet;

use crate::action::Action;
use crate::error::{ConvergeError, Result};

// ---------------------------------------------------------------------------
// PackageInstaller
// ---------------------------------------------------------------------------

/// Declared packages, validated and deduplicated in first-seen order.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageInstaller {
    packages: Vec<String>,
}

impl PackageInstaller {
    /// Fails on the first empty or whitespace-only name.
    pub fn new<S: AsRef<str>>(declared: &[S]) -> Result<Self> {
        validate(declared)?;
        let mut seen = HashSet::new();
        let packages = declared
            .iter()
            .map(|p| p.as_ref())
            .filter(|p| seen.insert(*p))
            .map(str::to_string)
            .collect();
        Ok(Self { packages })
    }

    pub fn packages(&self) -> &[String] {
        &self.packages
    }

    pub fn actions(&self) -> Vec<Action> {
        self.packages.iter().map(Action::install).collect()
    }
}

pub fn validate<S: AsRef<str>>(declared: &[S]) -> Result<()> {
    match declared.iter().position(|p| p.as_ref().trim().is_empty()) {
        Some(index) => Err(ConvergeError::Validation {
            index,
            value: declared[index].as_ref().to_string(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_first_occurrence_order() {
        let installer = PackageInstaller::new(&["a", "b", "a", "c"]).unwrap();
        let names: Vec<_> = installer.actions().into_iter().map(|a| a.name).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn empty_declaration_yields_no_actions() {
        let installer = PackageInstaller::new::<&str>(&[]).unwrap();
        assert!(installer.actions().is_empty());
    }

    #[test]
    fn empty_name_fails_with_index() {
        let err = PackageInstaller::new(&["mysql-client", "", "mysql-shared"]).unwrap_err();
        assert!(matches!(err, ConvergeError::Validation { index: 1, .. }));
    }

    #[test]
    fn whitespace_name_fails_with_index() {
        let err = PackageInstaller::new(&["a", "b", " \t"]).unwrap_err();
        match err {
            ConvergeError::Validation { index, value } => {
                assert_eq!(index, 2);
                assert_eq!(value, " \t");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn accepts_owned_strings() {
        let declared = vec!["mysql".to_string(), "mysql-devel".to_string()];
        let installer = PackageInstaller::new(&declared).unwrap();
        assert_eq!(installer.packages(), declared.as_slice());
    }
}
