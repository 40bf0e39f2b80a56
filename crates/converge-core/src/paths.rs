use std::path::{Path, PathBuf};

pub const CONVERGE_DIR: &str = ".converge";
pub const CONFIG_FILE: &str = ".converge/config.yaml";
pub const RECORD_FILE: &str = ".converge/last-run.yaml";

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn record_path(root: &Path) -> PathBuf {
    root.join(RECORD_FILE)
}
