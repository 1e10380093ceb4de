use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort an evaluation.
///
/// Per-metric problems in the simulator log (unparseable values, missing
/// lines) never show up here; they are absorbed by default substitution.
#[derive(Error, Debug)]
pub enum EvalError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Candidate has {actual} values, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Failed to launch simulator {}: {source}", .path.display())]
    SimulatorLaunch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Simulator exited with status {}", .code.map_or_else(|| "signal".to_string(), |c| c.to_string()))]
    SimulatorFailed { code: Option<i32> },

    #[error("Workspace error at {}: {source}", .path.display())]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EvalError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub(crate) fn workspace(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Workspace {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, EvalError>;
