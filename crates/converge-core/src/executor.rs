//! Collaborator seams for a convergence pass.
//!
//! The engine never touches the system itself. Prerequisite steps go through a
//! [`StepRunner`] and every planned action goes through an [`ActionExecutor`].
//! Both calls are blocking; a runner that wants a deadline enforces it itself
//! and reports the overrun as an ordinary error.
//!
//! Two families of implementations live here:
//! - `Recording*`: no side effects, used for `converge plan` and in tests.
//! - `Shell*`: render a configured command template and run it via `sh -c`.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::process::{Command, Stdio};
use std::time::Duration;

use anyhow::{bail, Context};
use wait_timeout::ChildExt;

use crate::action::Action;

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Executes a named prerequisite unit.
pub trait StepRunner {
    fn run_step(&mut self, step: &str) -> anyhow::Result<()>;
}

/// Performs a repository or package operation against the real system.
pub trait ActionExecutor {
    fn execute(&mut self, action: &Action) -> anyhow::Result<()>;
}

// ---------------------------------------------------------------------------
// Recording implementations
// ---------------------------------------------------------------------------

/// Remembers which steps were requested and always succeeds.
#[derive(Debug, Default)]
pub struct RecordingStepRunner {
    pub ran: Vec<String>,
}

impl RecordingStepRunner {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StepRunner for RecordingStepRunner {
    fn run_step(&mut self, step: &str) -> anyhow::Result<()> {
        self.ran.push(step.to_string());
        Ok(())
    }
}

/// Remembers every dispatched action and always succeeds.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    pub dispatched: Vec<Action>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ActionExecutor for RecordingExecutor {
    fn execute(&mut self, action: &Action) -> anyhow::Result<()> {
        self.dispatched.push(action.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Shell implementations
// ---------------------------------------------------------------------------

/// Runs action templates keyed by action kind (`repository`, `install`,
/// `gpgkey`). Templates may reference `{kind}`, `{name}` and `{operation}`;
/// `{name}` is shell-quoted on substitution.
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    templates: HashMap<String, String>,
    timeout: Duration,
}

impl ShellExecutor {
    pub fn new(templates: HashMap<String, String>, timeout: Duration) -> Self {
        Self { templates, timeout }
    }

    pub fn render(&self, action: &Action) -> anyhow::Result<String> {
        let template = self
            .templates
            .get(action.kind.as_str())
            .with_context(|| format!("no command configured for {} actions", action.kind))?;
        Ok(render_template(template, action))
    }
}

impl ActionExecutor for ShellExecutor {
    fn execute(&mut self, action: &Action) -> anyhow::Result<()> {
        let command = self.render(action)?;
        tracing::debug!(%command, "running action command");
        run_shell(&command, self.timeout)
    }
}

/// Runs the command configured for a step id. Steps without a command are
/// treated as already satisfied by the environment.
#[derive(Debug, Clone)]
pub struct ShellStepRunner {
    commands: HashMap<String, String>,
    timeout: Duration,
}

impl ShellStepRunner {
    pub fn new(commands: HashMap<String, String>, timeout: Duration) -> Self {
        Self { commands, timeout }
    }
}

impl StepRunner for ShellStepRunner {
    fn run_step(&mut self, step: &str) -> anyhow::Result<()> {
        let Some(command) = self.commands.get(step) else {
            tracing::warn!(step, "no command configured for step; treating as satisfied");
            return Ok(());
        };
        tracing::debug!(step, %command, "running step command");
        run_shell(command, self.timeout)
    }
}

fn render_template(template: &str, action: &Action) -> String {
    template
        .replace("{kind}", action.kind.as_str())
        .replace("{operation}", action.operation.as_str())
        .replace("{name}", &shell_quote(&action.name))
}

fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Run `command` through `sh -c`, killing it once `timeout` elapses.
///
/// Output goes to anonymous temp files rather than pipes so a chatty command
/// cannot fill a pipe buffer while we wait for exit.
fn run_shell(command: &str, timeout: Duration) -> anyhow::Result<()> {
    let shell = which::which("sh").context("no 'sh' found on PATH")?;

    let mut stdout = tempfile::tempfile().context("failed to create stdout capture")?;
    let mut stderr = tempfile::tempfile().context("failed to create stderr capture")?;

    let mut child = Command::new(shell)
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout.try_clone()?))
        .stderr(Stdio::from(stderr.try_clone()?))
        .spawn()
        .with_context(|| format!("failed to spawn '{command}'"))?;

    let Some(status) = child.wait_timeout(timeout)? else {
        let _ = child.kill();
        let _ = child.wait();
        bail!("timed out after {timeout:?}: {command}");
    };

    let out = read_capture(&mut stdout)?;
    if !out.is_empty() {
        tracing::debug!(output = %out.trim_end(), "command stdout");
    }

    if !status.success() {
        let err = read_capture(&mut stderr)?;
        let hint: String = err.trim().chars().take(500).collect();
        match status.code() {
            Some(code) => bail!("'{command}' exited with status {code}: {hint}"),
            None => bail!("'{command}' was terminated by a signal: {hint}"),
        }
    }
    Ok(())
}

fn read_capture(file: &mut File) -> anyhow::Result<String> {
    file.seek(SeekFrom::Start(0))?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn templates(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn render_quotes_name() {
        let exec = ShellExecutor::new(
            templates(&[("install", "apt-get {operation} -y {name}")]),
            Duration::from_secs(5),
        );
        let cmd = exec.render(&Action::install("mysql-client")).unwrap();
        assert_eq!(cmd, "apt-get install -y 'mysql-client'");
    }

    #[test]
    fn render_escapes_single_quotes() {
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }

    #[test]
    fn missing_template_is_an_error() {
        let exec = ShellExecutor::new(HashMap::new(), Duration::from_secs(5));
        let err = exec.render(&Action::add_gpgkey("RPM-GPG-KEY-percona")).unwrap_err();
        assert!(err.to_string().contains("gpgkey"));
    }

    #[test]
    fn shell_executor_success_and_failure() {
        let mut exec = ShellExecutor::new(
            templates(&[("install", "true"), ("repository", "echo boom >&2; exit 3")]),
            Duration::from_secs(5),
        );
        exec.execute(&Action::install("a")).unwrap();
        let err = exec.execute(&Action::add_repository("r")).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("status 3"), "{msg}");
        assert!(msg.contains("boom"), "{msg}");
    }

    #[test]
    fn shell_executor_times_out() {
        let mut exec = ShellExecutor::new(
            templates(&[("install", "sleep 5")]),
            Duration::from_millis(100),
        );
        let err = exec.execute(&Action::install("slow")).unwrap_err();
        assert!(err.to_string().contains("timed out after 100ms"), "{err}");
    }

    #[test]
    fn step_runner_without_command_is_satisfied() {
        let mut runner = ShellStepRunner::new(HashMap::new(), Duration::from_secs(5));
        runner.run_step("apt::default").unwrap();
    }

    #[test]
    fn step_runner_propagates_failure() {
        let mut runner = ShellStepRunner::new(
            templates(&[("apt::default", "false")]),
            Duration::from_secs(5),
        );
        assert!(runner.run_step("apt::default").is_err());
    }

    #[test]
    fn recording_collaborators_remember_calls() {
        let mut steps = RecordingStepRunner::new();
        steps.run_step("mysql::client").unwrap();
        let mut exec = RecordingExecutor::new();
        exec.execute(&Action::install("x")).unwrap();
        assert_eq!(steps.ran, vec!["mysql::client"]);
        assert_eq!(exec.dispatched, vec![Action::install("x")]);
    }
}
