//! Error types for the patch engine.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for patch operations.
pub type PatchResult<T> = Result<T, PatchError>;

/// Errors that can occur while patching a file.
#[derive(Error, Debug)]
pub enum PatchError {
    #[error("Function {0} not found")]
    FunctionNotFound(String),

    #[error("Class {0} not found")]
    ClassNotFound(String),

    #[error("Line {0} out of range")]
    LineOutOfRange(usize),

    #[error("Invalid line range: {from}-{to}")]
    InvalidRange { from: usize, to: usize },

    #[error("No valid changes found in AI suggestions")]
    NoChanges,

    #[error("No changes could be applied")]
    NothingApplied,

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),
}
