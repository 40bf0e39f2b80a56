use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvergeError {
    #[error("not initialized: run 'converge init'")]
    NotInitialized,

    #[error("invalid package name at index {index}: {value:?} is empty or whitespace")]
    Validation { index: usize, value: String },

    #[error("prerequisite step '{step}' failed: {reason}")]
    PrerequisiteFailure { step: String, reason: String },

    #[error("action {index} ({action}) failed: {reason}")]
    ExecutionFailure {
        index: usize,
        action: String,
        reason: String,
    },

    #[error("run cancelled before action {index}")]
    Cancelled { index: usize },

    #[error("invalid transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("invalid platform family: {0}")]
    InvalidPlatform(String),

    #[error("invalid implementation '{0}': expected default, percona, mariadb or galera")]
    InvalidVariant(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl ConvergeError {
    /// Position in the action list of the action that stopped the run, if any.
    pub fn action_index(&self) -> Option<usize> {
        match self {
            Self::ExecutionFailure { index, .. } | Self::Cancelled { index } => Some(*index),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConvergeError>;
