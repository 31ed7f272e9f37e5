use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("No home directory")]
    NoHomeDir,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Task {task} failed: {error}")]
    TaskFailure { task: String, error: String },

    #[error("Execution timed out after {0:?}")]
    ExecutionTimeout(std::time::Duration),

    #[error("Task {task} depends on unknown task {dependency}")]
    UnknownDependency { task: String, dependency: String },

    #[error("Task already queued: {0}")]
    DuplicateTask(String),

    #[error("Agent not found: {0}")]
    UnknownAgent(String),

    #[error("Invalid orchestrator state: {0}")]
    InvalidState(String),

    #[error("Task join error: {0}")]
    TaskJoin(String),
}

impl Error {
    /// Fatal errors abort the run; task failures are collected into the report.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::TaskFailure { .. })
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
