use crate::output::{print_actions, print_json};
use anyhow::Context;
use converge_core::{
    config::Config,
    engine::{CancelFlag, ConvergenceEngine},
    executor::{ShellExecutor, ShellStepRunner},
    record::RunRecord,
};
use std::path::Path;
use std::time::Duration;

pub fn run(
    root: &Path,
    steps: &[String],
    fresh: bool,
    timeout: Option<u64>,
    json: bool,
) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let timeout = timeout.map(Duration::from_secs).unwrap_or_else(|| config.timeout());
    if timeout.is_zero() {
        anyhow::bail!("timeout must be greater than 0");
    }

    let registry = super::seed_registry(root, &config, steps, fresh)?;
    let mut engine = ConvergenceEngine::new(config.declaration()?, registry);
    let mut runner = ShellStepRunner::new(config.step_commands(), timeout);
    let mut executor = ShellExecutor::new(config.command_templates(), timeout);

    let mut record = RunRecord::begin(config.platform_family);
    let result = match engine.plan(&mut runner) {
        Ok(plan) => {
            record.variant = Some(plan.variant);
            record.actions = plan.actions;
            engine.execute(&record.actions, &mut executor, &CancelFlag::new())
        }
        Err(e) => Err(e),
    };

    record.steps = engine.registry().steps().to_vec();
    record.completed = engine.completed();
    record.phase = engine.phase();
    if let Err(e) = &result {
        record.fail(e);
    }
    record.finish();
    record.save(root).context("failed to save run record")?;

    if json {
        print_json(&record)?;
    } else if result.is_ok() {
        print_actions(&record.actions);
        println!();
        println!(
            "Converged: {} action(s) applied ({})",
            record.completed,
            record.variant.map(|v| v.as_str()).unwrap_or("default")
        );
    }

    result.context("convergence failed")?;
    Ok(())
}
