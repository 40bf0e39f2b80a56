pub mod apply;
pub mod init;
pub mod plan;
pub mod record;
pub mod validate;

use anyhow::Context;
use converge_core::{config::Config, record::RunRecord, registry::StepRegistry};
use std::path::Path;

/// Steps already processed before this pass: configured `already_run`,
/// `--step` flags, and unless `fresh`, the steps the last run completed.
pub(crate) fn seed_registry(
    root: &Path,
    config: &Config,
    extra: &[String],
    fresh: bool,
) -> anyhow::Result<StepRegistry> {
    let mut registry = config.registry(extra);
    if !fresh {
        if let Some(last) = RunRecord::load(root).context("failed to load last run record")? {
            for step in &last.steps {
                registry.mark_run(step);
            }
        }
    }
    Ok(registry)
}
