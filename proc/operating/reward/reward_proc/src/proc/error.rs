//! 批处理进程错误

use db_repo::RepoError;
use reward::EngineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot JSON error: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("Settings YAML error: {0}")]
    Settings(#[from] serde_yaml::Error),

    #[error("Ledger error: {0}")]
    Ledger(#[from] RepoError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Settings invalid: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ProcError>;
