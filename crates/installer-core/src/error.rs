//! Error types shared by the installer core

use std::io;
use thiserror::Error;

/// Result alias for installer operations
pub type Result<T, E = InstallError> = std::result::Result<T, E>;

/// Errors raised while loading or validating a configuration schema
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to parse schema: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("schema has no entries in the flags domain `{0}`")]
    MissingFlagsDomain(String),

    #[error("duplicate key `{key}` in domain `{domain}`")]
    DuplicateKey { domain: String, key: String },

    #[error("module flag `{key}` must be a bool entry")]
    FlagNotBool { key: String },

    #[error("module flag `{key}` cannot depend on another entry")]
    FlagHasDependency { key: String },

    #[error("entry `{domain}.{key}` depends on unknown module flag `{flag}`")]
    UnknownDependency {
        domain: String,
        key: String,
        flag: String,
    },

    #[error("bool entry `{domain}.{key}` has default `{default}`, expected `y` or `n`")]
    InvalidBoolDefault {
        domain: String,
        key: String,
        default: String,
    },

    #[error("entry `{domain}.{key}` has a malformed placeholder in `{default}`")]
    MalformedPlaceholder {
        domain: String,
        key: String,
        default: String,
    },

    #[error("entry `{domain}.{key}` references unknown placeholder `{name}`")]
    UnknownPlaceholder {
        domain: String,
        key: String,
        name: String,
    },
}

/// Errors surfaced by the installer core
///
/// Invalid operator input is never an error: the prompt engine re-asks until
/// it gets a usable answer.
#[derive(Debug, Error)]
pub enum InstallError {
    /// Environment is not fit for installation (privilege, mandatory tool).
    #[error("{0}")]
    Precondition(String),

    /// Operator declined a confirmation or closed the input stream.
    #[error("Installation canceled by user")]
    Cancelled,

    #[error("invalid configuration schema: {0}")]
    Schema(#[from] SchemaError),

    #[error("invalid question `{prompt}`: {reason}")]
    InvalidQuestion { prompt: String, reason: String },

    #[error("invalid step catalog: {0}")]
    InvalidCatalog(String),

    #[error("invalid installation plan: {0}")]
    InvalidPlan(String),

    /// A system executor operation failed; the run stops here.
    #[error("step `{step}` failed: {cause:#}")]
    Step { step: String, cause: anyhow::Error },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl InstallError {
    /// Whether this error is a clean, operator-initiated stop
    pub fn is_cancelled(&self) -> bool {
        matches!(self, InstallError::Cancelled)
    }

    /// Process exit code matching this error
    pub fn exit_code(&self) -> i32 {
        match self {
            InstallError::Cancelled => 0,
            _ => 1,
        }
    }
}
