//! Error types for commitwright modules using thiserror.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from the repository surface.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("No Git repository found at or above {0}")]
    NoRepository(PathBuf),

    #[error("Failed to open repository at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },

    #[error("Failed to read the index: {0}")]
    Index(#[source] git2::Error),

    #[error("Failed to diff '{path}' against HEAD: {source}")]
    Diff {
        path: String,
        #[source]
        source: git2::Error,
    },

    #[error("Failed to list staged changes: {0}")]
    ListStaged(#[source] git2::Error),

    #[error("Failed to write commit message to {path}: {source}")]
    WriteMessage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Diff task for '{0}' did not complete")]
    TaskFailed(String),
}

/// Errors from the model client, already classified.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("Gemini API key is not configured. Run `commitwright set-key` or set GEMINI_API_KEY.")]
    NotConfigured,

    #[error("Rate limit exceeded. Please wait a few minutes and try again: {0}")]
    RateLimited(String),

    #[error("AI generation failed: {0}")]
    Failed(String),
}

/// Errors from settings loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ParseFile {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid setting `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Errors from the credential store.
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("No config directory available for storing credentials")]
    NoConfigDir,

    #[error("Failed to read credentials from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write credentials to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from commit message generation, one variant per failure class.
#[derive(Error, Debug)]
pub enum CommitError {
    #[error("No Git repository found. Open a repository and try again.")]
    NoRepository,

    #[error("{0}")]
    NotConfigured(GenerationError),

    #[error("{0}")]
    RateLimited(GenerationError),

    #[error("Empty response from AI model")]
    EmptyResponse,

    #[error("{0}")]
    GenerationFailed(GenerationError),

    #[error("Repository error: {0}")]
    Repository(#[source] GitError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to create commit: {0}")]
    CommitFailed(#[source] git2::Error),

    #[error("Git config error (missing user.name or user.email): {0}")]
    SignatureMissing(#[source] git2::Error),
}

impl From<GitError> for CommitError {
    fn from(err: GitError) -> Self {
        match err {
            GitError::NoRepository(_) => CommitError::NoRepository,
            other => CommitError::Repository(other),
        }
    }
}

impl From<GenerationError> for CommitError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::NotConfigured => CommitError::NotConfigured(err),
            GenerationError::RateLimited(_) => CommitError::RateLimited(err),
            GenerationError::Failed(_) => CommitError::GenerationFailed(err),
        }
    }
}
