use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// PlatformFamily
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformFamily {
    Debian,
    Rhel,
    #[default]
    Other,
}

impl PlatformFamily {
    pub fn all() -> &'static [PlatformFamily] {
        &[
            PlatformFamily::Debian,
            PlatformFamily::Rhel,
            PlatformFamily::Other,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlatformFamily::Debian => "debian",
            PlatformFamily::Rhel => "rhel",
            PlatformFamily::Other => "other",
        }
    }

    /// Client packages installed when the configuration does not list any.
    pub fn default_client_packages(self) -> &'static [&'static str] {
        match self {
            PlatformFamily::Debian => &["mysql-client", "libmysqlclient-dev"],
            PlatformFamily::Rhel => &["mysql", "mysql-devel"],
            PlatformFamily::Other => &[],
        }
    }
}

impl fmt::Display for PlatformFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PlatformFamily {
    type Err = crate::error::ConvergeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debian" => Ok(PlatformFamily::Debian),
            "rhel" => Ok(PlatformFamily::Rhel),
            "other" => Ok(PlatformFamily::Other),
            _ => Err(crate::error::ConvergeError::InvalidPlatform(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Variant
// ---------------------------------------------------------------------------

/// Mutually exclusive database distribution. Exactly one is active per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    #[default]
    Default,
    Percona,
    Mariadb,
    Galera,
}

impl Variant {
    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Default => "default",
            Variant::Percona => "percona",
            Variant::Mariadb => "mariadb",
            Variant::Galera => "galera",
        }
    }

    /// Galera clusters ship from the MariaDB repository.
    pub fn is_mariadb_family(self) -> bool {
        matches!(self, Variant::Mariadb | Variant::Galera)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Variant {
    type Err = crate::error::ConvergeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "default" => Ok(Variant::Default),
            "percona" => Ok(Variant::Percona),
            "mariadb" => Ok(Variant::Mariadb),
            "galera" => Ok(Variant::Galera),
            other => Err(crate::error::ConvergeError::InvalidVariant(
                other.to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_parses_known_families() {
        for family in PlatformFamily::all() {
            let parsed: PlatformFamily = family.as_str().parse().unwrap();
            assert_eq!(parsed, *family);
        }
    }

    #[test]
    fn platform_rejects_unknown() {
        let err = "solaris".parse::<PlatformFamily>().unwrap_err();
        assert!(err.to_string().contains("solaris"));
    }

    #[test]
    fn empty_implementation_is_default() {
        assert_eq!("".parse::<Variant>().unwrap(), Variant::Default);
        assert_eq!("  ".parse::<Variant>().unwrap(), Variant::Default);
    }

    #[test]
    fn galera_is_mariadb_family() {
        assert!(Variant::Galera.is_mariadb_family());
        assert!(Variant::Mariadb.is_mariadb_family());
        assert!(!Variant::Percona.is_mariadb_family());
        assert!(!Variant::Default.is_mariadb_family());
    }

    #[test]
    fn variant_yaml_is_snake_case() {
        let yaml = serde_yaml::to_string(&Variant::Galera).unwrap();
        assert_eq!(yaml.trim(), "galera");
    }
}
