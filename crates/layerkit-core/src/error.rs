//! Error type shared by every scaffolding phase

use std::path::PathBuf;
use thiserror::Error;

/// Exit status for usage and configuration problems (and resolution failures)
pub const EXIT_USAGE: u8 = 1;
/// Exit status when the template source resolved but holds no files
pub const EXIT_EMPTY_TEMPLATE: u8 = 2;
/// Exit status when one or more files failed to copy
pub const EXIT_COPY_ERRORS: u8 = 3;

/// Broad grouping used by callers that only care about the phase that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Source,
    EmptyTemplate,
    Concurrency,
}

#[derive(Debug, Error)]
pub enum ScaffoldError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Target directory not found: {}", .0.display())]
    TargetNotFound(PathBuf),

    #[error("Target is not a directory: {}", .0.display())]
    TargetNotDirectory(PathBuf),

    #[error("Target {} is not an eligible project: {reason}", path.display())]
    TargetNotEligible { path: PathBuf, reason: String },

    #[error("Failed to parse {}: {message}", path.display())]
    ManifestParse { path: PathBuf, message: String },

    #[error("Template source not found: {}", .0.display())]
    TemplateSourceNotFound(PathBuf),

    #[error("git is not available: {0}")]
    VcsUnavailable(String),

    #[error("`git {command}` failed: {message}")]
    GitCommandFailed { command: String, message: String },

    #[error("Template root {} is the target directory itself", .0.display())]
    SelfTargetConflict(PathBuf),

    #[error("Template source {source_spec} contains no files (check --ref and --subdir)")]
    EmptyTemplate { source_spec: String },

    #[error("Another run (pid {pid}) holds the lock at {}; remove it manually if that process is gone", path.display())]
    ConcurrentRunDetected { pid: u32, path: PathBuf },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl ScaffoldError {
    /// Wrap an I/O error with a short description of what was being done
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidConfig(_)
            | Self::TargetNotFound(_)
            | Self::TargetNotDirectory(_)
            | Self::TargetNotEligible { .. }
            | Self::ManifestParse { .. } => ErrorCategory::Configuration,
            Self::TemplateSourceNotFound(_)
            | Self::VcsUnavailable(_)
            | Self::GitCommandFailed { .. }
            | Self::SelfTargetConflict(_)
            | Self::Io { .. } => ErrorCategory::Source,
            Self::EmptyTemplate { .. } => ErrorCategory::EmptyTemplate,
            Self::ConcurrentRunDetected { .. } => ErrorCategory::Concurrency,
        }
    }

    /// Process exit status for this error
    pub fn exit_code(&self) -> u8 {
        match self.category() {
            ErrorCategory::EmptyTemplate => EXIT_EMPTY_TEMPLATE,
            _ => EXIT_USAGE,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScaffoldError>;
