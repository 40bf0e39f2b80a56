use crate::output::print_json;
use anyhow::Context;
use converge_core::{
    config::Config,
    paths,
    types::{PlatformFamily, Variant},
};
use std::path::Path;

pub fn run(root: &Path, platform: &str, implementation: &str, json: bool) -> anyhow::Result<()> {
    let platform: PlatformFamily = platform.parse()?;
    let variant: Variant = implementation.parse()?;

    let path = paths::config_path(root);
    let data = Config::new(platform, variant).to_yaml()?;
    let created = converge_core::io::write_if_missing(&path, data.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;

    if json {
        print_json(&serde_json::json!({
            "path": path,
            "created": created,
        }))?;
    } else if created {
        println!("Created {} ({platform}, {variant})", paths::CONFIG_FILE);
    } else {
        println!("{} already exists; left unchanged", paths::CONFIG_FILE);
    }
    Ok(())
}

