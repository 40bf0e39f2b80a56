use crate::output::{print_actions, print_json};
use anyhow::Context;
use converge_core::record::RunRecord;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let Some(record) = RunRecord::load(root).context("failed to load run record")? else {
        anyhow::bail!("no run recorded yet: run 'converge apply'");
    };

    if json {
        return print_json(&record);
    }

    println!("Run:      {}", record.id);
    println!("Started:  {}", record.started_at.to_rfc3339());
    println!("Finished: {}", record.finished_at.to_rfc3339());
    println!("Platform: {}", record.platform);
    if let Some(variant) = record.variant {
        println!("Variant:  {variant}");
    }
    println!("Phase:    {}", record.phase);
    println!("Steps:    {}", record.steps.join(", "));
    println!("Applied:  {}/{}", record.completed, record.actions.len());
    if let Some(failure) = &record.failure {
        match failure.index {
            Some(i) => println!("Failed at action {i}: {}", failure.message),
            None => println!("Failed: {}", failure.message),
        }
    }
    println!();
    print_actions(&record.actions);
    Ok(())
}
