//! Run record: what the last `apply` did, persisted for the operator and for
//! seeding the next pass.

use crate::action::ActionList;
use crate::engine::RunPhase;
use crate::error::{ConvergeError, Result};
use crate::paths;
use crate::types::{PlatformFamily, Variant};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunFailure {
    /// Index into `actions`; absent when the pass failed before execution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub platform: PlatformFamily,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<Variant>,
    /// Every step known to have been processed when the pass ended.
    pub steps: Vec<String>,
    pub actions: ActionList,
    /// Actions the executor finished successfully.
    pub completed: usize,
    pub phase: RunPhase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<RunFailure>,
}

impl RunRecord {
    pub fn begin(platform: PlatformFamily) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            started_at: now,
            finished_at: now,
            platform,
            variant: None,
            steps: Vec::new(),
            actions: ActionList::new(),
            completed: 0,
            phase: RunPhase::Init,
            failure: None,
        }
    }

    pub fn fail(&mut self, err: &ConvergeError) {
        self.phase = RunPhase::Failed;
        self.failure = Some(RunFailure {
            index: err.action_index(),
            message: err.to_string(),
        });
    }

    pub fn finish(&mut self) {
        self.finished_at = Utc::now();
    }

    pub fn is_success(&self) -> bool {
        self.phase == RunPhase::Done
    }

    /// Returns `Ok(None)` when no run has been recorded yet.
    pub fn load(root: &Path) -> Result<Option<Self>> {
        let path = paths::record_path(root);
        if !path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(&path)?;
        Ok(Some(serde_yaml::from_str(&data)?))
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&paths::record_path(root), data.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use tempfile::TempDir;

    #[test]
    fn missing_record_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(RunRecord::load(dir.path()).unwrap().is_none());
    }

    #[test]
    fn failed_record_roundtrips_with_index() {
        let dir = TempDir::new().unwrap();
        let mut record = RunRecord::begin(PlatformFamily::Rhel);
        record.actions = vec![Action::install("a"), Action::install("b")].into();
        record.completed = 1;
        record.fail(&ConvergeError::ExecutionFailure {
            index: 1,
            action: "install[b] install".to_string(),
            reason: "exit 100".to_string(),
        });
        record.finish();
        record.save(dir.path()).unwrap();

        let loaded = RunRecord::load(dir.path()).unwrap().unwrap();
        assert_eq!(loaded.id, record.id);
        assert_eq!(loaded.phase, RunPhase::Failed);
        assert!(!loaded.is_success());
        let failure = loaded.failure.unwrap();
        assert_eq!(failure.index, Some(1));
        assert!(failure.message.contains("exit 100"));
        assert_eq!(loaded.actions.len(), 2);
    }

    #[test]
    fn prerequisite_failure_has_no_index() {
        let mut record = RunRecord::begin(PlatformFamily::Debian);
        record.fail(&ConvergeError::PrerequisiteFailure {
            step: "apt::default".to_string(),
            reason: "lock held".to_string(),
        });
        assert_eq!(record.failure.unwrap().index, None);
    }
}
