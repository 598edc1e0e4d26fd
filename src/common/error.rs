use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Sub-step of repository preparation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrepareStage {
    Clone,
    Open,
    Clean,
    Checkout,
    Pull,
}

impl fmt::Display for PrepareStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Clone => "clone",
            Self::Open => "open",
            Self::Clean => "clean",
            Self::Checkout => "checkout",
            Self::Pull => "pull",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum PublisherError {
    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Validation error: {field} - {message}")]
    ValidationError {
        field: String,
        message: String,
        value: Option<String>,
    },

    #[error("Failed to {stage} repository {repository}: {message}")]
    RepositoryPreparationError {
        stage: PrepareStage,
        repository: String,
        message: String,
        #[source]
        source: Option<git2::Error>,
    },

    #[error("Pre-run script `{command}` failed: {message}")]
    HookExecutionError {
        command: String,
        message: String,
        exit_code: Option<i32>,
        stderr: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("File system operation failed: {message}")]
    FileSystemError {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Failed to commit changes in repository {repository}: {message}")]
    CommitError {
        repository: String,
        message: String,
        #[source]
        source: Option<git2::Error>,
    },

    #[error("Failed to push repository {repository}: {message}")]
    PushError {
        repository: String,
        message: String,
        #[source]
        source: Option<git2::Error>,
    },

    #[error("Git operation failed: {message}")]
    GitError {
        message: String,
        #[source]
        source: Option<git2::Error>,
    },
}

impl PublisherError {
    pub fn config_error(message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::ConfigError {
            message: message.into(),
            path,
            source: None,
        }
    }

    pub fn config_error_with_source(
        message: impl Into<String>,
        path: Option<PathBuf>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::ConfigError {
            message: message.into(),
            path,
            source: Some(Box::new(source)),
        }
    }

    pub fn validation_error(
        field: impl Into<String>,
        message: impl Into<String>,
        value: Option<String>,
    ) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
            value,
        }
    }

    pub fn preparation_error(
        stage: PrepareStage,
        repository: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::RepositoryPreparationError {
            stage,
            repository: repository.into(),
            message: message.into(),
            source: None,
        }
    }

    pub fn preparation_error_with_source(
        stage: PrepareStage,
        repository: impl Into<String>,
        message: impl Into<String>,
        source: git2::Error,
    ) -> Self {
        Self::RepositoryPreparationError {
            stage,
            repository: repository.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn hook_error(
        command: impl Into<String>,
        message: impl Into<String>,
        exit_code: Option<i32>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::HookExecutionError {
            command: command.into(),
            message: message.into(),
            exit_code,
            stderr: stderr.into(),
            source: None,
        }
    }

    pub fn hook_error_with_source(
        command: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Self::HookExecutionError {
            command: command.into(),
            message: message.into(),
            exit_code: None,
            stderr: String::new(),
            source: Some(source),
        }
    }

    pub fn filesystem_error(message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::FileSystemError {
            message: message.into(),
            path,
            source: None,
        }
    }

    pub fn filesystem_error_with_source(
        message: impl Into<String>,
        path: Option<PathBuf>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::FileSystemError {
            message: message.into(),
            path,
            source: Some(Box::new(source)),
        }
    }

    pub fn commit_error_with_source(
        repository: impl Into<String>,
        message: impl Into<String>,
        source: git2::Error,
    ) -> Self {
        Self::CommitError {
            repository: repository.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn push_error(repository: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PushError {
            repository: repository.into(),
            message: message.into(),
            source: None,
        }
    }

    pub fn push_error_with_source(
        repository: impl Into<String>,
        message: impl Into<String>,
        source: git2::Error,
    ) -> Self {
        Self::PushError {
            repository: repository.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn git_error(message: impl Into<String>) -> Self {
        Self::GitError {
            message: message.into(),
            source: None,
        }
    }

    pub fn git_error_with_source(message: impl Into<String>, source: git2::Error) -> Self {
        Self::GitError {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Standard error captured from a failed pre-run script, if any.
    pub fn captured_stderr(&self) -> Option<&str> {
        match self {
            Self::HookExecutionError { stderr, .. } if !stderr.trim().is_empty() => {
                Some(stderr.as_str())
            }
            _ => None,
        }
    }
}

impl From<git2::Error> for PublisherError {
    fn from(error: git2::Error) -> Self {
        Self::git_error_with_source("Git operation failed", error)
    }
}

impl From<std::io::Error> for PublisherError {
    fn from(error: std::io::Error) -> Self {
        Self::filesystem_error_with_source("File system operation failed", None, error)
    }
}

impl From<serde_yaml::Error> for PublisherError {
    fn from(error: serde_yaml::Error) -> Self {
        Self::config_error_with_source("Failed to parse config file", None, error)
    }
}

impl From<walkdir::Error> for PublisherError {
    fn from(error: walkdir::Error) -> Self {
        let path = error.path().map(|p| p.to_path_buf());
        Self::filesystem_error_with_source("Failed to walk directory", path, error)
    }
}
