use crate::config::ConfigError;
use crate::process::{CommandOutput, CommandSpec};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Every way a pipeline run can fail. Each variant aborts the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Cannot find the '{launcher}' command. {hint}")]
    ToolNotFound { launcher: String, hint: String },

    #[error("Host tool installation is invalid: {} was not found. {hint}", .checked.display())]
    ToolInstallationInvalid { checked: PathBuf, hint: String },

    #[error(
        "Symbolic link chain starting at {} did not resolve within {max_hops} hops",
        .start.display()
    )]
    SymlinkCycle { start: PathBuf, max_hops: usize },

    #[error("Missing prerequisite '{prerequisite}'. {hint}")]
    MissingPrerequisite { prerequisite: String, hint: String },

    #[error("{tool} failed: {message}")]
    CollaboratorFailure {
        tool: String,
        exit_code: Option<i32>,
        message: String,
    },

    #[error("File system operation failed on {}: {message}", .path.display())]
    FileSystemFailure { path: PathBuf, message: String },
}

impl PipelineError {
    pub fn filesystem(path: &Path, error: anyhow::Error) -> Self {
        PipelineError::FileSystemFailure {
            path: path.to_path_buf(),
            message: format!("{:#}", error),
        }
    }

    /// The command could not be started at all.
    pub fn spawn_failed(command: &CommandSpec, error: anyhow::Error) -> Self {
        PipelineError::CollaboratorFailure {
            tool: command.tool_name(),
            exit_code: None,
            message: format!("{:#}", error),
        }
    }

    /// The command ran and reported failure.
    pub fn command_failed(command: &CommandSpec, output: &CommandOutput) -> Self {
        PipelineError::CollaboratorFailure {
            tool: command.tool_name(),
            exit_code: output.status,
            message: output.failure_message(),
        }
    }

    pub fn collaborator(tool: impl Into<String>, error: anyhow::Error) -> Self {
        PipelineError::CollaboratorFailure {
            tool: tool.into(),
            exit_code: None,
            message: format!("{:#}", error),
        }
    }

    /// Short machine-friendly name of the variant, used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Configuration(_) => "ConfigurationError",
            PipelineError::ToolNotFound { .. } => "ToolNotFound",
            PipelineError::ToolInstallationInvalid { .. } => "ToolInstallationInvalid",
            PipelineError::SymlinkCycle { .. } => "SymlinkCycle",
            PipelineError::MissingPrerequisite { .. } => "MissingPrerequisite",
            PipelineError::CollaboratorFailure { .. } => "CollaboratorFailure",
            PipelineError::FileSystemFailure { .. } => "FileSystemFailure",
        }
    }
}
