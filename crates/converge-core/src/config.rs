use crate::action::{ActionKind, ActionList};
use crate::engine::{ConvergenceEngine, Declaration};
use crate::error::{ConvergeError, Result};
use crate::executor::RecordingStepRunner;
use crate::paths;
use crate::registry::StepRegistry;
use crate::steps;
use crate::types::{PlatformFamily, Variant};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::time::Duration;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

impl ConfigWarning {
    fn warning(message: impl Into<String>) -> Self {
        Self {
            level: WarnLevel::Warning,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            level: WarnLevel::Error,
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub platform_family: PlatformFamily,
    /// `default`, `percona`, `mariadb`, `galera`, or empty for default.
    #[serde(default)]
    pub implementation: String,
    /// Overrides the platform's default client packages when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_packages: Option<Vec<String>>,
    #[serde(default = "default_driver")]
    pub driver: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub already_run: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Command templates keyed by action kind.
    #[serde(default)]
    pub commands: BTreeMap<String, String>,
    /// Command per step id for the shell step runner.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub steps: BTreeMap<String, String>,
}

fn default_version() -> u32 {
    1
}

fn default_driver() -> String {
    "mysql".to_string()
}

fn default_timeout_secs() -> u64 {
    600
}

fn default_commands(platform: PlatformFamily) -> BTreeMap<String, String> {
    let pairs: &[(&str, &str)] = match platform {
        PlatformFamily::Debian => &[
            ("install", "apt-get install -y {name}"),
            ("repository", "add-apt-repository -y {name}"),
        ],
        PlatformFamily::Rhel => &[
            ("install", "yum install -y {name}"),
            ("repository", "yum-config-manager --enable {name}"),
            ("gpgkey", "rpm --import /etc/pki/rpm-gpg/{name}"),
        ],
        PlatformFamily::Other => &[],
    };
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl Config {
    pub fn new(platform: PlatformFamily, implementation: Variant) -> Self {
        Self {
            version: 1,
            platform_family: platform,
            implementation: implementation.as_str().to_string(),
            client_packages: None,
            driver: default_driver(),
            already_run: Vec::new(),
            timeout_secs: default_timeout_secs(),
            commands: default_commands(platform),
            steps: BTreeMap::new(),
        }
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(ConvergeError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let data = self.to_yaml()?;
        crate::io::atomic_write(&paths::config_path(root), data.as_bytes())
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn variant(&self) -> Result<Variant> {
        self.implementation.parse()
    }

    pub fn packages(&self) -> Vec<String> {
        match &self.client_packages {
            Some(explicit) => explicit.clone(),
            None => self
                .platform_family
                .default_client_packages()
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn declaration(&self) -> Result<Declaration> {
        Ok(Declaration {
            platform: self.platform_family,
            implementation: self.variant()?,
            packages: self.packages(),
            driver: self.driver.clone(),
        })
    }

    /// Registry seeded from `already_run` plus any extra steps.
    pub fn registry<S: AsRef<str>>(&self, extra: &[S]) -> StepRegistry {
        self.already_run
            .iter()
            .map(String::as_str)
            .chain(extra.iter().map(|s| s.as_ref()))
            .collect()
    }

    pub fn command_templates(&self) -> HashMap<String, String> {
        self.commands.clone().into_iter().collect()
    }

    pub fn step_commands(&self) -> HashMap<String, String> {
        self.steps.clone().into_iter().collect()
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        // 1. Implementation must name a known variant
        if let Err(e) = self.variant() {
            warnings.push(ConfigWarning::error(e.to_string()));
        }

        // 2. A zero timeout would fail every action immediately
        if self.timeout_secs == 0 {
            warnings.push(ConfigWarning::error("timeout_secs must be greater than 0"));
        }

        // 3. Step ids in already_run and steps should be ones we know about
        for step in &self.already_run {
            if !steps::is_known(step) {
                warnings.push(ConfigWarning::warning(format!(
                    "unknown step '{step}' in already_run"
                )));
            }
        }
        for (step, command) in &self.steps {
            if !steps::is_known(step) {
                warnings.push(ConfigWarning::warning(format!(
                    "unknown step '{step}' in steps"
                )));
            }
            if command.trim().is_empty() {
                warnings.push(ConfigWarning::warning(format!(
                    "step '{step}' has an empty command"
                )));
            }
        }

        // 4. Command templates: known kinds, non-empty
        for (kind, template) in &self.commands {
            if !ActionKind::is_valid(kind) {
                warnings.push(ConfigWarning::warning(format!(
                    "unknown action kind '{kind}' in commands"
                )));
            } else if template.trim().is_empty() {
                warnings.push(ConfigWarning::error(format!(
                    "command template for '{kind}' is empty"
                )));
            }
        }

        // 5. Dry plan: package names must be valid and every kind the plan
        //    emits needs a template
        if let Ok(declaration) = self.declaration() {
            match dry_plan(declaration, self.registry::<&str>(&[])) {
                Ok(actions) => {
                    for kind in ActionKind::all() {
                        if actions.count_kind(*kind) > 0 && !self.commands.contains_key(kind.as_str()) {
                            warnings.push(ConfigWarning::warning(format!(
                                "plan needs '{kind}' actions but commands.{kind} is not set"
                            )));
                        }
                    }
                }
                Err(e) => warnings.push(ConfigWarning::error(e.to_string())),
            }
        }

        warnings
    }
}

fn dry_plan(declaration: Declaration, registry: StepRegistry) -> Result<ActionList> {
    let mut engine = ConvergenceEngine::new(declaration, registry);
    Ok(engine.plan(&mut RecordingStepRunner::new())?.actions)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn errors(warnings: &[ConfigWarning]) -> Vec<&str> {
        warnings
            .iter()
            .filter(|w| w.level == WarnLevel::Error)
            .map(|w| w.message.as_str())
            .collect()
    }

    #[test]
    fn default_config_roundtrip() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::new(PlatformFamily::Rhel, Variant::Galera);
        cfg.save(dir.path()).unwrap();

        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded.platform_family, PlatformFamily::Rhel);
        assert_eq!(loaded.variant().unwrap(), Variant::Galera);
        assert_eq!(loaded.commands.len(), 3);
    }

    #[test]
    fn load_without_file_is_not_initialized() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Config::load(dir.path()),
            Err(ConvergeError::NotInitialized)
        ));
    }

    #[test]
    fn minimal_yaml_uses_defaults() {
        let cfg: Config = serde_yaml::from_str("platform_family: debian\n").unwrap();
        assert_eq!(cfg.variant().unwrap(), Variant::Default);
        assert_eq!(cfg.packages(), vec!["mysql-client", "libmysqlclient-dev"]);
        assert_eq!(cfg.driver, "mysql");
        assert_eq!(cfg.timeout(), Duration::from_secs(600));
    }

    #[test]
    fn explicit_packages_override_platform_defaults() {
        let cfg: Config =
            serde_yaml::from_str("platform_family: rhel\nclient_packages: [mariadb]\n").unwrap();
        assert_eq!(cfg.packages(), vec!["mariadb"]);
    }

    #[test]
    fn registry_merges_already_run_and_extra() {
        let mut cfg = Config::new(PlatformFamily::Debian, Variant::Default);
        cfg.already_run = vec![steps::APT.to_string()];
        let reg = cfg.registry(&[steps::PERCONA_REPO, steps::APT]);
        assert_eq!(reg.steps(), &[steps::APT, steps::PERCONA_REPO]);
    }

    #[test]
    fn generated_config_validates_clean() {
        for platform in [PlatformFamily::Debian, PlatformFamily::Rhel] {
            let cfg = Config::new(platform, Variant::Mariadb);
            assert!(cfg.validate().is_empty(), "{platform}: {:?}", cfg.validate());
        }
    }

    #[test]
    fn unknown_implementation_is_an_error() {
        let mut cfg = Config::new(PlatformFamily::Debian, Variant::Default);
        cfg.implementation = "oracle".to_string();
        assert!(errors(&cfg.validate())[0].contains("oracle"));
    }

    #[test]
    fn blank_package_is_an_error() {
        let mut cfg = Config::new(PlatformFamily::Debian, Variant::Default);
        cfg.client_packages = Some(vec!["mysql-client".into(), "".into()]);
        let errs = errors(&cfg.validate()).join("\n");
        assert!(errs.contains("index 1"), "{errs}");
    }

    #[test]
    fn zero_timeout_is_an_error() {
        let mut cfg = Config::new(PlatformFamily::Debian, Variant::Default);
        cfg.timeout_secs = 0;
        assert_eq!(errors(&cfg.validate()).len(), 1);
    }

    #[test]
    fn missing_template_for_needed_kind_warns() {
        let mut cfg = Config::new(PlatformFamily::Rhel, Variant::Default);
        cfg.already_run = vec![steps::PERCONA_REPO.to_string()];
        cfg.commands.remove("gpgkey");
        let warnings = cfg.validate();
        assert!(warnings
            .iter()
            .any(|w| w.level == WarnLevel::Warning && w.message.contains("commands.gpgkey")));
    }

    #[test]
    fn unknown_steps_and_kinds_warn() {
        let mut cfg = Config::new(PlatformFamily::Debian, Variant::Default);
        cfg.already_run = vec!["mysql::server".to_string()];
        cfg.commands.insert("purge".to_string(), "apt-get purge {name}".to_string());
        let messages: Vec<_> = cfg.validate().into_iter().map(|w| w.message).collect();
        assert!(messages.iter().any(|m| m.contains("mysql::server")));
        assert!(messages.iter().any(|m| m.contains("purge")));
    }
}
