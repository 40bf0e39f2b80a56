use crate::output::{print_actions, print_json};
use anyhow::Context;
use converge_core::{config::Config, engine::ConvergenceEngine, executor::RecordingStepRunner};
use std::path::Path;

pub fn run(root: &Path, steps: &[String], fresh: bool, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let registry = super::seed_registry(root, &config, steps, fresh)?;

    // A recording runner stands in for real steps so planning has no side effects.
    let mut engine = ConvergenceEngine::new(config.declaration()?, registry);
    let plan = engine.plan(&mut RecordingStepRunner::new())?;

    if json {
        return print_json(&plan);
    }

    println!("Platform: {}", config.platform_family);
    println!("Variant:  {}", plan.variant);
    if plan.steps_run.is_empty() {
        println!("Steps:    (all already processed)");
    } else {
        println!("Steps:    {}", plan.steps_run.join(", "));
    }
    println!();
    print_actions(&plan.actions);
    Ok(())
}
